use logscope_types::{Filter, FilterKind, LogLevel, LogRecord};

/// Level requirement implied by the level filters in a set
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelConstraint {
    /// No level filter
    Any,
    /// Every level filter names this level
    Exactly(LogLevel),
    /// Two level filters disagree, nothing can match
    Impossible,
}

/// Active filters compiled for repeated evaluation
///
/// Level filters are exact equality; keyword and search filters match when
/// the lowercase needle occurs in the raw line or the message. Everything
/// ANDs together.
#[derive(Clone, Debug)]
pub struct CompiledFilter {
    /// Combined level requirement
    level: LevelConstraint,

    /// Lowercased keyword/search needles
    needles: Vec<String>,
}

impl CompiledFilter {
    /// Compile a list of active filters
    pub fn new(filters: &[Filter]) -> Self {
        let mut level = LevelConstraint::Any;
        let mut needles = Vec::new();

        for filter in filters {
            match filter.kind {
                FilterKind::Level => {
                    let wanted = filter
                        .level
                        .unwrap_or_else(|| LogLevel::from_alias(&filter.value));
                    level = match level {
                        LevelConstraint::Any => LevelConstraint::Exactly(wanted),
                        LevelConstraint::Exactly(current) if current == wanted => level,
                        _ => LevelConstraint::Impossible,
                    };
                }
                FilterKind::Keyword | FilterKind::Search => {
                    if !filter.value.is_empty() {
                        needles.push(filter.value.to_lowercase());
                    }
                }
            }
        }

        Self { level, needles }
    }

    /// Check if a log record matches every filter
    pub fn matches(&self, record: &LogRecord) -> bool {
        match self.level {
            LevelConstraint::Any => {}
            LevelConstraint::Exactly(level) if record.level == level => {}
            _ => return false,
        }

        if self.needles.is_empty() {
            return true;
        }

        let raw = record.raw.to_lowercase();
        let message = record.message.as_deref().map(str::to_lowercase);
        self.needles.iter().all(|needle| {
            raw.contains(needle.as_str())
                || message.as_deref().is_some_and(|m| m.contains(needle.as_str()))
        })
    }

    /// Check if filter is empty (matches everything)
    pub fn is_empty(&self) -> bool {
        self.level == LevelConstraint::Any && self.needles.is_empty()
    }

    /// The level requirement, used by stores to answer from level indexes
    pub fn level_constraint(&self) -> LevelConstraint {
        self.level
    }

    /// Whether only level filters are present
    pub fn is_level_only(&self) -> bool {
        self.needles.is_empty()
    }
}

/// Find all case-insensitive occurrences of `term` in `text` (for highlighting)
///
/// Returned ranges are byte offsets into `text`.
pub fn find_matches(text: &str, term: &str) -> Vec<(usize, usize)> {
    if term.is_empty() {
        return Vec::new();
    }

    let needle = term.to_lowercase();
    let lower = text.to_lowercase();
    // Lowercasing can change byte lengths for some scripts; fall back to no
    // highlight rather than produce offsets that do not line up.
    if lower.len() != text.len() {
        return Vec::new();
    }

    lower
        .match_indices(needle.as_str())
        .map(|(start, m)| (start, start + m.len()))
        .collect()
}
