use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use logscope_types::{Filter, LogRecord, SortOrder};

use crate::filter::{CompiledFilter, LevelConstraint};
use crate::store::{LevelCounts, LogStore, StoreError, sort_key, validate_sequence};

/// Thread-safe ring buffer for log records
///
/// A fixed slot arena with a head cursor. Once full, every insert
/// overwrites the oldest slot.
pub struct RingBuffer {
    /// Internal storage
    inner: RwLock<Ring>,

    /// Maximum capacity
    capacity: usize,

    /// Next record ID, never reset
    next_id: AtomicU64,

    /// Records overwritten since the last clear
    evicted: AtomicU64,
}

struct Ring {
    slots: Vec<Option<Arc<LogRecord>>>,
    /// Slot holding the oldest record
    head: usize,
    len: usize,
    counts: LevelCounts,
    last_sequence: Option<u64>,
}

impl Ring {
    fn get(&self, position: usize) -> Option<&Arc<LogRecord>> {
        if position >= self.len {
            return None;
        }
        self.slots[(self.head + position) % self.slots.len()].as_ref()
    }

    /// Live records, oldest first
    fn iter(&self) -> impl Iterator<Item = &Arc<LogRecord>> + '_ {
        (0..self.len).filter_map(move |position| self.get(position))
    }

    fn count(&self, filter: &CompiledFilter) -> usize {
        if filter.is_level_only() {
            return match filter.level_constraint() {
                LevelConstraint::Any => self.len,
                LevelConstraint::Exactly(level) => self.counts.get(level),
                LevelConstraint::Impossible => 0,
            };
        }

        self.iter().filter(|record| filter.matches(record)).count()
    }

    /// Matching records in the requested order
    fn view<'a>(
        &'a self,
        filter: &'a CompiledFilter,
        sort: SortOrder,
    ) -> Box<dyn Iterator<Item = &'a Arc<LogRecord>> + 'a> {
        let matching = self.iter().filter(move |record| filter.matches(record));
        if sort == SortOrder::Default {
            return Box::new(matching);
        }

        // Stable sort keeps insertion order for equal keys
        let mut sorted: Vec<&Arc<LogRecord>> = matching.collect();
        sorted.sort_by_key(|record| sort_key(record, sort));
        Box::new(sorted.into_iter())
    }
}

impl RingBuffer {
    /// Create a new ring buffer with the given capacity
    pub fn new(capacity: usize) -> Result<Self, StoreError> {
        if capacity == 0 {
            return Err(StoreError::InvalidCapacity);
        }

        Ok(Self {
            inner: RwLock::new(Ring {
                slots: vec![None; capacity],
                head: 0,
                len: 0,
                counts: LevelCounts::default(),
                last_sequence: None,
            }),
            capacity,
            next_id: AtomicU64::new(0),
            evicted: AtomicU64::new(0),
        })
    }

    /// Record at a raw position of the live window (0 = oldest)
    pub fn get(&self, position: usize) -> Option<Arc<LogRecord>> {
        self.inner.read().get(position).cloned()
    }
}

impl LogStore for RingBuffer {
    fn insert_batch(&self, records: Vec<LogRecord>) -> Result<usize, StoreError> {
        let mut ring = self.inner.write();
        validate_sequence(ring.last_sequence, &records)?;

        let mut evicted = 0;
        for mut record in records {
            record.id = self.next_id.fetch_add(1, Ordering::SeqCst);
            ring.last_sequence = Some(record.sequence_number);
            ring.counts.increment(record.level);

            let capacity = self.capacity;
            if ring.len == capacity {
                let head = ring.head;
                let old = ring.slots[head].replace(Arc::new(record));
                if let Some(old) = old {
                    ring.counts.decrement(old.level);
                }
                ring.head = (head + 1) % capacity;
                evicted += 1;
            } else {
                let tail = (ring.head + ring.len) % capacity;
                ring.slots[tail] = Some(Arc::new(record));
                ring.len += 1;
            }
        }

        self.evicted.fetch_add(evicted as u64, Ordering::SeqCst);
        Ok(evicted)
    }

    fn len(&self) -> usize {
        self.inner.read().len
    }

    fn count(&self, filters: &[Filter]) -> usize {
        let filter = CompiledFilter::new(filters);
        self.inner.read().count(&filter)
    }

    fn counts(&self, filters: &[Filter]) -> (usize, usize) {
        let filter = CompiledFilter::new(filters);
        let ring = self.inner.read();
        (ring.len, ring.count(&filter))
    }

    fn fetch(
        &self,
        offset: usize,
        limit: usize,
        filters: &[Filter],
        sort: SortOrder,
    ) -> Vec<Arc<LogRecord>> {
        let filter = CompiledFilter::new(filters);
        let ring = self.inner.read();

        ring.view(&filter, sort)
            .skip(offset)
            .take(limit)
            .cloned()
            .collect()
    }

    fn search(&self, term: &str, filters: &[Filter], sort: SortOrder) -> Vec<usize> {
        if term.is_empty() {
            return Vec::new();
        }

        let filter = CompiledFilter::new(filters);
        let needle = CompiledFilter::new(&[Filter::search(term)]);
        let ring = self.inner.read();

        ring.view(&filter, sort)
            .enumerate()
            .filter(|(_, record)| needle.matches(record))
            .map(|(position, _)| position)
            .collect()
    }

    fn position(&self, id: u64, filters: &[Filter], sort: SortOrder) -> Option<usize> {
        let filter = CompiledFilter::new(filters);
        let ring = self.inner.read();

        // Ids grow with storage order; anything older than the head is gone
        if ring.get(0).is_none_or(|oldest| id < oldest.id) {
            return None;
        }
        ring.view(&filter, sort).position(|record| record.id == id)
    }

    fn clear(&self) {
        let mut ring = self.inner.write();
        ring.slots.iter_mut().for_each(|slot| *slot = None);
        ring.head = 0;
        ring.len = 0;
        ring.counts = LevelCounts::default();
        ring.last_sequence = None;
        self.evicted.store(0, Ordering::SeqCst);
    }

    fn capacity(&self) -> Option<usize> {
        Some(self.capacity)
    }

    fn evicted(&self) -> u64 {
        self.evicted.load(Ordering::SeqCst)
    }

    fn level_counts(&self) -> LevelCounts {
        self.inner.read().counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::{record, seqs, timed};
    use logscope_types::LogLevel;
    use proptest::prelude::*;

    fn lines(range: std::ops::RangeInclusive<u64>) -> Vec<LogRecord> {
        range
            .map(|seq| record(seq, LogLevel::Info, &format!("line {seq}")))
            .collect()
    }

    #[test]
    fn test_evicts_oldest_when_full() {
        let buffer = RingBuffer::new(3).unwrap();
        assert_eq!(buffer.insert_batch(lines(1..=2)), Ok(0));
        assert_eq!(buffer.insert_batch(lines(3..=5)), Ok(2));

        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.evicted(), 2);
        assert_eq!(seqs(&buffer.fetch(0, 10, &[], SortOrder::Default)), vec![3, 4, 5]);
        assert_eq!(buffer.get(0).map(|r| r.sequence_number), Some(3));
        assert!(buffer.get(3).is_none());
    }

    #[test]
    fn test_ids_are_monotonic_across_clear() {
        let buffer = RingBuffer::new(10).unwrap();
        buffer.insert_batch(lines(1..=2)).unwrap();
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.evicted(), 0);

        // Sequence tracking restarts, ids do not
        buffer.insert_batch(lines(1..=1)).unwrap();
        assert_eq!(buffer.get(0).map(|r| r.id), Some(2));
    }

    #[test]
    fn test_regressing_batch_is_rejected_whole() {
        let buffer = RingBuffer::new(10).unwrap();
        buffer.insert_batch(lines(1..=3)).unwrap();

        let result = buffer.insert_batch(lines(4..=4).into_iter().chain(lines(2..=2)).collect());
        assert_eq!(result, Err(StoreError::SequenceRegression { last: 4, got: 2 }));
        assert_eq!(buffer.len(), 3);

        assert!(buffer.insert_batch(lines(4..=4)).is_ok());
    }

    #[test]
    fn test_count_with_filters() {
        let buffer = RingBuffer::new(10).unwrap();
        buffer
            .insert_batch(vec![
                record(1, LogLevel::Error, "db down"),
                record(2, LogLevel::Info, "db up"),
                record(3, LogLevel::Error, "cache down"),
            ])
            .unwrap();

        assert_eq!(buffer.count(&[]), 3);
        assert_eq!(buffer.count(&[Filter::level(LogLevel::Error)]), 2);
        assert_eq!(buffer.count(&[Filter::keyword("DB")]), 2);
        assert_eq!(
            buffer.count(&[Filter::level(LogLevel::Error), Filter::keyword("db")]),
            1
        );
        assert_eq!(
            buffer.count(&[Filter::level(LogLevel::Error), Filter::level(LogLevel::Info)]),
            0
        );
    }

    #[test]
    fn test_level_counts_follow_eviction() {
        let buffer = RingBuffer::new(2).unwrap();
        buffer
            .insert_batch(vec![
                record(1, LogLevel::Error, "a"),
                record(2, LogLevel::Warn, "b"),
                record(3, LogLevel::Warn, "c"),
            ])
            .unwrap();

        let counts = buffer.level_counts();
        assert_eq!(counts.get(LogLevel::Error), 0);
        assert_eq!(counts.get(LogLevel::Warn), 2);
        assert_eq!(buffer.count(&[Filter::level(LogLevel::Error)]), 0);
    }

    #[test]
    fn test_timestamp_sort_puts_untimed_first() {
        let buffer = RingBuffer::new(10).unwrap();
        buffer
            .insert_batch(vec![
                timed(1, Some(30)),
                timed(2, None),
                timed(3, Some(10)),
                timed(4, Some(10)),
            ])
            .unwrap();

        let sorted = buffer.fetch(0, 10, &[], SortOrder::Timestamp);
        assert_eq!(seqs(&sorted), vec![2, 3, 4, 1]);
    }

    #[test]
    fn test_level_sort_and_search_positions() {
        let buffer = RingBuffer::new(10).unwrap();
        buffer
            .insert_batch(vec![
                record(1, LogLevel::Info, "request ok"),
                record(2, LogLevel::Error, "request failed"),
                record(3, LogLevel::Unknown, "noise"),
                record(4, LogLevel::Error, "disk full"),
            ])
            .unwrap();

        let sorted = buffer.fetch(0, 10, &[], SortOrder::Level);
        assert_eq!(seqs(&sorted), vec![2, 4, 1, 3]);

        assert_eq!(buffer.search("request", &[], SortOrder::Default), vec![0, 1]);
        assert_eq!(buffer.search("request", &[], SortOrder::Level), vec![0, 2]);
        assert_eq!(
            buffer.search("REQUEST", &[Filter::level(LogLevel::Error)], SortOrder::Default),
            vec![0]
        );
        assert!(buffer.search("", &[], SortOrder::Default).is_empty());
    }

    #[test]
    fn test_fetch_window() {
        let buffer = RingBuffer::new(100).unwrap();
        buffer.insert_batch(lines(1..=50)).unwrap();

        assert_eq!(seqs(&buffer.fetch(10, 3, &[], SortOrder::Default)), vec![11, 12, 13]);
        assert!(buffer.fetch(60, 3, &[], SortOrder::Default).is_empty());
        assert_eq!(
            buffer.fetch_one(49, &[], SortOrder::Default).map(|r| r.sequence_number),
            Some(50)
        );
    }

    proptest! {
        #[test]
        fn prop_retains_newest_capacity_records(capacity in 1usize..64, extra in 0usize..200, chunk in 1usize..17) {
            let buffer = RingBuffer::new(capacity).unwrap();
            let total = (capacity + extra) as u64;
            let all = lines(1..=total);

            let mut evicted = 0;
            for batch in all.chunks(chunk) {
                evicted += buffer.insert_batch(batch.to_vec()).unwrap();
            }

            prop_assert_eq!(buffer.len(), capacity);
            prop_assert_eq!(evicted, extra);
            prop_assert_eq!(buffer.len() as u64, total - buffer.evicted());
            prop_assert_eq!(buffer.get(0).map(|r| r.sequence_number), Some(extra as u64 + 1));
            prop_assert_eq!(
                buffer.get(capacity - 1).map(|r| r.sequence_number),
                Some(total)
            );
        }
    }
}
