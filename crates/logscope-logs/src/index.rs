use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use logscope_types::{Filter, LogLevel, LogRecord, SortOrder};

use crate::filter::{CompiledFilter, LevelConstraint};
use crate::store::{LevelCounts, LogStore, StoreError, validate_sequence};

/// Unbounded store that keeps every record
///
/// Besides the append-ordered record list it maintains one position list
/// per level and a timestamp-ordered set, so level-only counts and
/// level/timestamp sorts never need a full scan and sort.
pub struct IndexedStore {
    inner: RwLock<Indexes>,

    /// Next record ID, never reset
    next_id: AtomicU64,
}

#[derive(Default)]
struct Indexes {
    records: Vec<Arc<LogRecord>>,
    /// Positions per level, indexed by `LogLevel::priority`
    by_level: [Vec<usize>; 6],
    /// (timestamp, position); `None` sorts first
    by_time: BTreeSet<(Option<DateTime<Utc>>, usize)>,
    last_sequence: Option<u64>,
}

impl Indexes {
    /// Positions in sort order, before filtering
    fn positions(&self, sort: SortOrder) -> Box<dyn Iterator<Item = usize> + '_> {
        match sort {
            SortOrder::Default => Box::new(0..self.records.len()),
            SortOrder::Timestamp => Box::new(self.by_time.iter().map(|(_, position)| *position)),
            SortOrder::Level => Box::new(
                LogLevel::ALL
                    .into_iter()
                    .flat_map(move |level| self.by_level[level.priority() as usize].iter().copied()),
            ),
        }
    }

    fn count(&self, filter: &CompiledFilter) -> usize {
        if filter.is_level_only() {
            return match filter.level_constraint() {
                LevelConstraint::Any => self.records.len(),
                LevelConstraint::Exactly(level) => self.by_level[level.priority() as usize].len(),
                LevelConstraint::Impossible => 0,
            };
        }

        self.view(filter, SortOrder::Default).count()
    }

    /// Matching records in the requested order
    fn view<'a>(
        &'a self,
        filter: &'a CompiledFilter,
        sort: SortOrder,
    ) -> Box<dyn Iterator<Item = &'a Arc<LogRecord>> + 'a> {
        // A single level filter under insertion or level order can walk
        // its own position list directly
        match (filter.level_constraint(), sort) {
            (LevelConstraint::Exactly(level), SortOrder::Default | SortOrder::Level) => {
                let records = self.by_level[level.priority() as usize]
                    .iter()
                    .map(move |position| &self.records[*position])
                    .filter(move |record| filter.matches(record));
                return Box::new(records);
            }
            (LevelConstraint::Impossible, _) => return Box::new(std::iter::empty()),
            _ => {}
        }

        Box::new(
            self.positions(sort)
                .map(move |position| &self.records[position])
                .filter(move |record| filter.matches(record)),
        )
    }
}

impl IndexedStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Indexes::default()),
            next_id: AtomicU64::new(0),
        }
    }
}

impl Default for IndexedStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LogStore for IndexedStore {
    fn insert_batch(&self, records: Vec<LogRecord>) -> Result<usize, StoreError> {
        let mut indexes = self.inner.write();
        validate_sequence(indexes.last_sequence, &records)?;

        indexes.records.reserve(records.len());
        for mut record in records {
            record.id = self.next_id.fetch_add(1, Ordering::SeqCst);
            let position = indexes.records.len();

            indexes.last_sequence = Some(record.sequence_number);
            indexes.by_level[record.level.priority() as usize].push(position);
            indexes.by_time.insert((record.timestamp, position));
            indexes.records.push(Arc::new(record));
        }

        Ok(0)
    }

    fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    fn count(&self, filters: &[Filter]) -> usize {
        let filter = CompiledFilter::new(filters);
        self.inner.read().count(&filter)
    }

    fn counts(&self, filters: &[Filter]) -> (usize, usize) {
        let filter = CompiledFilter::new(filters);
        let indexes = self.inner.read();
        (indexes.records.len(), indexes.count(&filter))
    }

    fn fetch(
        &self,
        offset: usize,
        limit: usize,
        filters: &[Filter],
        sort: SortOrder,
    ) -> Vec<Arc<LogRecord>> {
        let filter = CompiledFilter::new(filters);
        let indexes = self.inner.read();

        indexes
            .view(&filter, sort)
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
        let indexes = self.inner.read();

        indexes
            .view(&filter, sort)
            .enumerate()
            .filter(|(_, record)| needle.matches(record))
            .map(|(position, _)| position)
            .collect()
    }

    fn position(&self, id: u64, filters: &[Filter], sort: SortOrder) -> Option<usize> {
        let filter = CompiledFilter::new(filters);
        let indexes = self.inner.read();
        indexes.view(&filter, sort).position(|record| record.id == id)
    }

    fn clear(&self) {
        *self.inner.write() = Indexes::default();
    }

    fn capacity(&self) -> Option<usize> {
        None
    }

    fn evicted(&self) -> u64 {
        0
    }

    fn level_counts(&self) -> LevelCounts {
        let indexes = self.inner.read();
        let mut counts = LevelCounts::default();
        for level in LogLevel::ALL {
            counts.set(level, indexes.by_level[level.priority() as usize].len());
        }
        counts
    }
}
