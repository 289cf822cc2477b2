use std::time::{Duration, Instant};

/// Default delay before the detail pane recomputes
pub const DETAIL_DEBOUNCE: Duration = Duration::from_millis(50);

/// Holds the latest requested target until it has been stable for `delay`
///
/// Polled from the UI tick with an explicit `Instant`; a newer request
/// replaces the pending one and restarts the delay.
#[derive(Debug)]
pub struct DetailDebouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> DetailDebouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Request a recompute for `target`
    pub fn request(&mut self, target: T, now: Instant) {
        self.pending = Some((target, now + self.delay));
    }

    /// Take the pending target once its deadline has passed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let ready = self
            .pending
            .as_ref()
            .is_some_and(|(_, deadline)| now >= *deadline);
        if !ready {
            return None;
        }
        self.pending.take().map(|(target, _)| target)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

impl<T> Default for DetailDebouncer<T> {
    fn default() -> Self {
        Self::new(DETAIL_DEBOUNCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_after_delay() {
        let start = Instant::now();
        let mut debouncer = DetailDebouncer::new(Duration::from_millis(50));
        debouncer.request(7, start);

        assert_eq!(debouncer.poll(start + Duration::from_millis(10)), None);
        assert_eq!(debouncer.poll(start + Duration::from_millis(50)), Some(7));
        assert_eq!(debouncer.poll(start + Duration::from_millis(60)), None);
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_newer_request_replaces_pending() {
        let start = Instant::now();
        let mut debouncer = DetailDebouncer::new(Duration::from_millis(50));
        debouncer.request(1, start);
        debouncer.request(2, start + Duration::from_millis(40));

        assert_eq!(debouncer.poll(start + Duration::from_millis(60)), None);
        assert_eq!(debouncer.poll(start + Duration::from_millis(90)), Some(2));
    }

    #[test]
    fn test_cancel() {
        let start = Instant::now();
        let mut debouncer = DetailDebouncer::default();
        debouncer.request("x", start);
        debouncer.cancel();
        assert_eq!(debouncer.poll(start + DETAIL_DEBOUNCE), None);
    }
}
