use std::sync::Arc;
use std::time::Instant;

use logscope_logs::{IngestEvent, LevelCounts, SharedStore};
use logscope_types::{LogRecord, SortOrder};

use super::action::ViewerAction;
use super::debounce::DetailDebouncer;
use super::history::CommandHistory;
use super::state::{StatusMessage, ViewerState};
use crate::commands::{CommandContext, CommandRegistry, CommandResult};

/// Store counters shown next to the record counts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// `None` for an unbounded store
    pub capacity: Option<usize>,
    pub evicted: u64,
    pub levels: LevelCounts,
}

/// Glue between the store, the viewer state and the command interpreter
///
/// Owns the single `ViewerState` value. Every store-dependent quantity the
/// reducer needs (counts, search matches) is recomputed here after the
/// actions that invalidate it.
pub struct Session {
    state: ViewerState,
    store: SharedStore,
    registry: CommandRegistry,
    history: CommandHistory,

    /// Selected record id awaiting a detail recompute
    debouncer: DetailDebouncer<Option<u64>>,
    /// Record currently shown in the detail pane
    detail: Option<Arc<LogRecord>>,

    /// Lines lost to rejected batches
    dropped: u64,
    /// Set once the source finished, with the command's exit code if any
    finished: Option<Option<i32>>,

    /// Ids behind the selection and current match as of the last refresh
    anchor: Anchor,

    counts_dirty: bool,
    matches_dirty: bool,
    should_quit: bool,
}

impl Session {
    pub fn new(store: SharedStore, follow_mode: bool) -> Self {
        Self {
            state: ViewerState::new(follow_mode),
            store,
            registry: CommandRegistry::new(),
            history: CommandHistory::new(),
            debouncer: DetailDebouncer::default(),
            detail: None,
            dropped: 0,
            finished: None,
            anchor: Anchor::default(),
            counts_dirty: true,
            matches_dirty: false,
            should_quit: false,
        }
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn registry(&self) -> CommandRegistry {
        self.registry
    }

    pub fn history_mut(&mut self) -> &mut CommandHistory {
        &mut self.history
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// `Some(exit_code)` once the input source finished
    pub fn finished(&self) -> Option<Option<i32>> {
        self.finished
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn request_quit(&mut self) {
        self.should_quit = true;
    }

    // ========================================================================
    // State transitions
    // ========================================================================

    /// Apply an action, then bring store-derived values up to date
    pub fn dispatch(&mut self, action: ViewerAction) {
        let before = QueryKey::of(&self.state);
        let previous_selection = self.state.selected_index;

        self.apply(&action);

        let after = QueryKey::of(&self.state);
        if before.filters_changed(&after) {
            self.counts_dirty = true;
        }
        if before != after || matches!(action, ViewerAction::ClearRecords) {
            self.matches_dirty = true;
        }
        if previous_selection != self.state.selected_index || before != after {
            self.request_detail();
        }

        self.refresh();
    }

    pub fn store_stats(&self) -> StoreStats {
        StoreStats {
            capacity: self.store.capacity(),
            evicted: self.store.evicted(),
            levels: self.store.level_counts(),
        }
    }

    /// New records were committed to the store
    ///
    /// Eviction, or a sort other than insertion order, moves existing
    /// records to new positions; the selection and current match follow
    /// their records, or are cleared once those records are gone.
    pub fn on_records_inserted(&mut self, inserted: usize, evicted: usize) {
        // The store already holds the batch, so positions are resolved from
        // ids taken before it landed
        let anchor = (evicted > 0 || self.state.sort_by != SortOrder::Default)
            .then_some(self.anchor)
            .filter(|anchor| anchor.selected.is_some() || anchor.current_match.is_some());

        self.apply(&ViewerAction::RecordsReceived(inserted));
        self.counts_dirty = true;
        self.matches_dirty = true;
        self.refresh();

        if let Some(anchor) = anchor {
            self.relocate(anchor);
        }
    }

    /// Translate a pipeline event into state changes
    pub fn on_ingest_event(&mut self, event: IngestEvent) {
        match event {
            IngestEvent::BatchInserted { inserted, evicted } => {
                self.on_records_inserted(inserted, evicted)
            }
            IngestEvent::BatchDropped { count, error } => {
                self.dropped += count as u64;
                self.dispatch(ViewerAction::SetStatus(Some(StatusMessage::error(format!(
                    "Dropped {count} lines: {error}"
                )))));
            }
            IngestEvent::Finished { exit_code } => {
                self.finished = Some(exit_code);
                self.dispatch(ViewerAction::SetStreaming(false));
                let status = match exit_code {
                    Some(0) | None => StatusMessage::info("Input finished"),
                    Some(code) => StatusMessage::error(format!("Process exited with code {code}")),
                };
                self.dispatch(ViewerAction::SetStatus(Some(status)));
            }
        }
    }

    /// Recompute counts and search matches if anything invalidated them
    pub fn refresh(&mut self) {
        if self.counts_dirty {
            self.counts_dirty = false;
            let (total, filtered) = self.store.counts(&self.state.active_filters);
            self.apply(&ViewerAction::CountsUpdated { total, filtered });
        }

        if self.matches_dirty {
            self.matches_dirty = false;
            if let Some(term) = self.state.search_term.clone() {
                let matches =
                    self.store
                        .search(&term, &self.state.active_filters, self.state.sort_by);
                self.apply(&ViewerAction::SearchMatchesUpdated(matches));
            }
        }

        // Follow mode moves the selection target without an explicit action
        let selected_id = self.selected_record().map(|record| record.id);
        if self.detail.as_ref().map(|record| record.id) != selected_id
            && !self.debouncer.is_pending()
        {
            self.request_detail();
        }

        self.anchor = Anchor {
            selected: selected_id,
            current_match: self.current_match_id(),
        };
    }

    fn apply(&mut self, action: &ViewerAction) {
        self.state = std::mem::take(&mut self.state).reduce(action);
    }

    fn current_match_id(&self) -> Option<u64> {
        let position = self.state.current_match()?;
        self.store
            .fetch_one(position, &self.state.active_filters, self.state.sort_by)
            .map(|record| record.id)
    }

    fn relocate(&mut self, anchor: Anchor) {
        let locate = |id: Option<u64>| {
            id.and_then(|id| {
                self.store
                    .position(id, &self.state.active_filters, self.state.sort_by)
            })
        };
        let selected = locate(anchor.selected);
        let current_match_index = locate(anchor.current_match)
            .and_then(|position| self.state.search_matches.binary_search(&position).ok());

        self.apply(&ViewerAction::PositionsShifted {
            selected,
            current_match_index,
        });
        self.refresh();
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Run a command line, remember it and show its outcome
    pub fn execute_command(&mut self, input: &str) -> CommandResult {
        self.history.add(input);
        let registry = self.registry;
        let result = registry.execute(input, self);

        let status = result.message.as_ref().map(|message| {
            if result.success {
                StatusMessage::info(message.clone())
            } else {
                StatusMessage::error(message.clone())
            }
        });
        self.dispatch(ViewerAction::SetStatus(status));
        self.dispatch(ViewerAction::SetCommandMode(false));
        result
    }

    // ========================================================================
    // Queries for the renderer
    // ========================================================================

    /// Records in the visible window
    pub fn visible_records(&self) -> Vec<Arc<LogRecord>> {
        self.store.fetch(
            self.state.scroll_offset,
            self.state.viewport_height,
            &self.state.active_filters,
            self.state.sort_by,
        )
    }

    pub fn selected_record(&self) -> Option<Arc<LogRecord>> {
        let index = self.state.selected_index?;
        self.store
            .fetch_one(index, &self.state.active_filters, self.state.sort_by)
    }

    /// Record shown in the detail pane (lags selection by the debounce)
    pub fn detail_record(&self) -> Option<&Arc<LogRecord>> {
        self.detail.as_ref()
    }

    /// Load the pending detail record once the debounce expires
    ///
    /// Returns true when the detail record changed and its layout needs to
    /// be measured again.
    pub fn poll_detail(&mut self, now: Instant) -> bool {
        if self.debouncer.poll(now).is_none() {
            return false;
        }
        self.detail = self.selected_record();
        true
    }

    fn request_detail(&mut self) {
        let target = self.selected_record().map(|record| record.id);
        self.debouncer.request(target, Instant::now());
    }
}

impl CommandContext for Session {
    fn dispatch(&mut self, action: ViewerAction) {
        Session::dispatch(self, action);
    }

    fn state(&self) -> &ViewerState {
        &self.state
    }

    fn clear_records(&mut self) {
        self.store.clear();
        self.detail = None;
        self.dispatch(ViewerAction::ClearRecords);
        self.counts_dirty = true;
        self.refresh();
        // Nothing left to show
        self.debouncer.cancel();
    }

    fn quit(&mut self) {
        self.should_quit = true;
    }
}

/// Records to find again after positions shift
#[derive(Clone, Copy, Debug, Default)]
struct Anchor {
    selected: Option<u64>,
    current_match: Option<u64>,
}

/// The parts of the state that decide which positions a query returns
#[derive(PartialEq)]
struct QueryKey {
    filters: Vec<logscope_types::Filter>,
    sort: logscope_types::SortOrder,
    term: Option<String>,
}

impl QueryKey {
    fn of(state: &ViewerState) -> Self {
        Self {
            filters: state.active_filters.clone(),
            sort: state.sort_by,
            term: state.search_term.clone(),
        }
    }

    fn filters_changed(&self, other: &Self) -> bool {
        self.filters != other.filters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use logscope_logs::{LogStore, StoreBacking};
    use logscope_types::{LogLevel, LogRecord};

    fn record(seq: u64, level: LogLevel, raw: &str) -> LogRecord {
        let mut record = LogRecord::new(raw.to_string(), seq);
        record.level = level;
        record
    }

    fn session_with(records: Vec<LogRecord>) -> Session {
        let store = StoreBacking::Bounded(1000).open().unwrap();
        let count = records.len();
        store.insert_batch(records).unwrap();
        let mut session = Session::new(store, true);
        session.on_records_inserted(count, 0);
        session
    }

    fn sample() -> Vec<LogRecord> {
        vec![
            record(1, LogLevel::Info, "service started"),
            record(2, LogLevel::Error, "db connection failed"),
            record(3, LogLevel::Info, "request ok"),
            record(4, LogLevel::Warn, "db slow"),
            record(5, LogLevel::Info, "request ok"),
        ]
    }

    fn bounded_session(capacity: usize, records: Vec<LogRecord>) -> Session {
        let store = StoreBacking::Bounded(capacity).open().unwrap();
        let mut session = Session::new(store, true);
        insert(&mut session, records);
        session
    }

    fn insert(session: &mut Session, records: Vec<LogRecord>) {
        let inserted = records.len();
        let evicted = session.store().insert_batch(records).unwrap();
        session.on_records_inserted(inserted, evicted);
    }

    #[test]
    fn test_counts_follow_inserts() {
        let session = session_with(sample());
        assert_eq!(session.state().total_count, 5);
        assert_eq!(session.state().filtered_count, 5);
        assert_eq!(session.state().total_received, 5);
        assert_eq!(session.visible_records().len(), 5);
    }

    #[test]
    fn test_filter_then_clear_restores_count() {
        let mut session = session_with(sample());

        let result = session.execute_command("/filter level:info");
        assert!(result.success);
        assert_eq!(session.state().filtered_count, 3);
        assert_eq!(session.state().total_count, 5);
        assert!(
            session
                .visible_records()
                .iter()
                .all(|r| r.level == LogLevel::Info)
        );

        session.execute_command("/filter request");
        assert_eq!(session.state().filtered_count, 2);

        session.execute_command("/clear-filter");
        assert_eq!(session.state().filtered_count, 5);
    }

    #[test]
    fn test_search_highlights_without_filtering() {
        let mut session = session_with(sample());
        session.execute_command("/search db");

        let state = session.state();
        assert_eq!(state.filtered_count, 5);
        assert_eq!(state.search_matches, vec![1, 3]);
        assert!(!state.follow_mode);

        session.execute_command("/n");
        assert_eq!(session.state().selected_index, Some(1));
        session.execute_command("/n");
        session.execute_command("/n");
        assert_eq!(session.state().selected_index, Some(1));

        // New data recomputes matches and keeps the position
        session
            .store()
            .insert_batch(vec![record(6, LogLevel::Error, "db down")])
            .unwrap();
        session.on_records_inserted(1, 0);
        assert_eq!(session.state().search_matches, vec![1, 3, 5]);
        assert_eq!(session.state().current_match_index, Some(0));

        session.execute_command("/clear-search");
        assert!(session.state().search_matches.is_empty());
    }

    #[test]
    fn test_selection_follows_its_record_through_eviction() {
        let mut session = bounded_session(5, sample());
        session.dispatch(ViewerAction::Select(Some(2)));
        assert_eq!(session.selected_record().map(|r| r.sequence_number), Some(3));

        insert(
            &mut session,
            vec![
                record(6, LogLevel::Info, "a"),
                record(7, LogLevel::Info, "b"),
            ],
        );
        assert_eq!(session.state().selected_index, Some(0));
        assert_eq!(session.selected_record().map(|r| r.sequence_number), Some(3));

        // The selected record itself falls off
        insert(&mut session, vec![record(8, LogLevel::Info, "c")]);
        assert_eq!(session.state().selected_index, None);
    }

    #[test]
    fn test_current_match_follows_its_record_through_eviction() {
        let mut session = bounded_session(5, sample());
        session.execute_command("/search db");
        session.execute_command("/n");
        session.execute_command("/n");
        assert_eq!(session.state().current_match(), Some(3));

        insert(
            &mut session,
            vec![
                record(6, LogLevel::Info, "x"),
                record(7, LogLevel::Info, "y"),
            ],
        );
        let state = session.state();
        assert_eq!(state.search_matches, vec![1]);
        assert_eq!(state.current_match_index, Some(0));
        assert_eq!(state.selected_index, Some(1));
        assert_eq!(session.selected_record().map(|r| r.sequence_number), Some(4));
    }

    #[test]
    fn test_selection_follows_its_record_under_level_sort() {
        let mut session = session_with(sample());
        session.execute_command("/sort level");
        session.dispatch(ViewerAction::Select(Some(1)));
        assert_eq!(session.selected_record().map(|r| r.level), Some(LogLevel::Warn));

        // A new error sorts ahead of the selected warning
        insert(&mut session, vec![record(6, LogLevel::Error, "db gone")]);
        assert_eq!(session.state().selected_index, Some(2));
        assert_eq!(session.selected_record().map(|r| r.sequence_number), Some(4));
    }

    #[test]
    fn test_store_stats() {
        let mut session = bounded_session(5, sample());
        insert(
            &mut session,
            vec![
                record(6, LogLevel::Error, "a"),
                record(7, LogLevel::Error, "b"),
            ],
        );

        let stats = session.store_stats();
        assert_eq!(stats.capacity, Some(5));
        assert_eq!(stats.evicted, 2);
        assert_eq!(stats.levels.get(LogLevel::Error), 2);
        assert_eq!(stats.levels.total(), 5);
        assert_eq!(session.state().total_received, 7);
    }

    #[test]
    fn test_search_positions_respect_filters() {
        let mut session = session_with(sample());
        session.execute_command("/filter db");
        session.execute_command("/search slow");
        assert_eq!(session.state().search_matches, vec![1]);
    }

    #[test]
    fn test_clear_empties_store_but_not_received() {
        let mut session = session_with(sample());
        let result = session.execute_command("/clear");
        assert_eq!(result.message.as_deref(), Some("Logs cleared"));
        assert!(session.store().is_empty());
        assert_eq!(session.state().total_count, 0);
        assert_eq!(session.state().total_received, 5);
    }

    #[test]
    fn test_clear_drops_pending_detail() {
        let mut session = session_with(sample());
        session.dispatch(ViewerAction::MoveSelection(1));
        session.execute_command("/clear");

        assert!(!session.poll_detail(Instant::now() + Duration::from_secs(1)));
        assert!(session.detail_record().is_none());
    }

    #[test]
    fn test_command_results_become_status() {
        let mut session = session_with(sample());
        session.dispatch(ViewerAction::SetCommandMode(true));

        session.execute_command("/bogus");
        let status = session.state().status.clone().unwrap();
        assert!(status.is_error());
        assert!(!session.state().command_mode);
        assert_eq!(session.history_mut().len(), 1);

        session.execute_command("/quit");
        assert!(session.should_quit());
    }

    #[test]
    fn test_detail_is_debounced() {
        let mut session = session_with(sample());
        session.dispatch(ViewerAction::MoveSelection(1));
        assert!(session.detail_record().is_none());

        assert!(session.poll_detail(Instant::now() + Duration::from_secs(1)));
        assert_eq!(session.detail_record().map(|r| r.sequence_number), Some(1));
    }

    #[test]
    fn test_dropped_batches_are_counted() {
        let mut session = session_with(sample());
        session.on_ingest_event(IngestEvent::BatchDropped {
            count: 3,
            error: logscope_logs::StoreError::SequenceRegression { last: 5, got: 1 },
        });
        assert_eq!(session.dropped(), 3);
        assert!(session.state().status.as_ref().is_some_and(|s| s.is_error()));
    }

    #[test]
    fn test_ingest_events_update_status() {
        let mut session = session_with(sample());
        session.dispatch(ViewerAction::SetStreaming(true));

        session.on_ingest_event(IngestEvent::Finished {
            exit_code: Some(2),
        });
        assert_eq!(session.finished(), Some(Some(2)));
        let state = session.state();
        assert!(!state.is_streaming);
        assert_eq!(
            state.status.as_ref().map(|s| s.text.as_str()),
            Some("Process exited with code 2")
        );
    }
}
