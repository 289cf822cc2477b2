//! The queryable log repository and its backing strategies.

use std::sync::Arc;

use thiserror::Error;

use logscope_types::{Filter, LogLevel, LogRecord, SortOrder};

use crate::buffer::RingBuffer;
use crate::index::IndexedStore;

/// Errors raised by a store
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("sequence number regression: last stored {last}, batch contains {got}")]
    SequenceRegression { last: u64, got: u64 },

    #[error("ring buffer capacity must be greater than zero")]
    InvalidCapacity,
}

/// Append-ordered, queryable repository of parsed records
///
/// Positions passed to and returned from queries always refer to the view
/// produced by the given filters and sort order, never to raw storage.
pub trait LogStore: Send + Sync {
    /// Insert a batch atomically. Returns the number of records evicted.
    fn insert_batch(&self, records: Vec<LogRecord>) -> Result<usize, StoreError>;

    /// Unfiltered record count
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Count records matching every filter
    fn count(&self, filters: &[Filter]) -> usize;

    /// `(len, count(filters))` read under one lock
    fn counts(&self, filters: &[Filter]) -> (usize, usize);

    /// A window of the filtered, sorted view
    fn fetch(
        &self,
        offset: usize,
        limit: usize,
        filters: &[Filter],
        sort: SortOrder,
    ) -> Vec<Arc<LogRecord>>;

    /// A single record of the filtered, sorted view
    fn fetch_one(&self, index: usize, filters: &[Filter], sort: SortOrder) -> Option<Arc<LogRecord>> {
        self.fetch(index, 1, filters, sort).into_iter().next()
    }

    /// Positions within the filtered, sorted view containing `term`
    fn search(&self, term: &str, filters: &[Filter], sort: SortOrder) -> Vec<usize>;

    /// Position of the record with `id` in the filtered, sorted view
    fn position(&self, id: u64, filters: &[Filter], sort: SortOrder) -> Option<usize>;

    /// Drop every record and reset per-store counters
    fn clear(&self);

    /// Maximum number of records retained, if bounded
    fn capacity(&self) -> Option<usize>;

    /// Records evicted since the store was created or last cleared
    fn evicted(&self) -> u64;

    /// Record count per level
    fn level_counts(&self) -> LevelCounts;
}

/// Shared handle used by the pipeline and the viewer
pub type SharedStore = Arc<dyn LogStore>;

/// Which backing strategy to open
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBacking {
    /// Fixed capacity ring buffer, oldest records evicted first
    Bounded(usize),
    /// Retain everything, with level and timestamp indexes
    Unbounded,
}

impl StoreBacking {
    pub fn open(self) -> Result<SharedStore, StoreError> {
        Ok(match self {
            Self::Bounded(capacity) => Arc::new(RingBuffer::new(capacity)?),
            Self::Unbounded => Arc::new(IndexedStore::new()),
        })
    }
}

/// Counts per log level
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LevelCounts {
    counts: [usize; 6],
}

impl LevelCounts {
    pub fn get(&self, level: LogLevel) -> usize {
        self.counts[level.priority() as usize]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub(crate) fn increment(&mut self, level: LogLevel) {
        self.counts[level.priority() as usize] += 1;
    }

    pub(crate) fn set(&mut self, level: LogLevel, count: usize) {
        self.counts[level.priority() as usize] = count;
    }

    pub(crate) fn decrement(&mut self, level: LogLevel) {
        let slot = &mut self.counts[level.priority() as usize];
        *slot = slot.saturating_sub(1);
    }
}

/// Check that a batch continues strictly after `last` and increases
/// strictly within itself
pub(crate) fn validate_sequence(last: Option<u64>, records: &[LogRecord]) -> Result<(), StoreError> {
    let mut previous = last;
    for record in records {
        match previous {
            Some(last) if record.sequence_number <= last => {
                return Err(StoreError::SequenceRegression {
                    last,
                    got: record.sequence_number,
                });
            }
            _ => {}
        }
        previous = Some(record.sequence_number);
    }
    Ok(())
}

/// Primary key of a record under a sort order
pub(crate) fn sort_key(record: &LogRecord, sort: SortOrder) -> SortKey {
    match sort {
        SortOrder::Default => SortKey::Insertion,
        SortOrder::Timestamp => SortKey::Timestamp(record.timestamp),
        SortOrder::Level => SortKey::Level(record.level),
    }
}

/// Primary sort key; ties always fall back to insertion order
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum SortKey {
    Insertion,
    Timestamp(Option<chrono::DateTime<chrono::Utc>>),
    Level(LogLevel),
}
