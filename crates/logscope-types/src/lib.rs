//! Shared types for logscope
//!
//! This crate contains data structures used across multiple logscope crates.

use chrono::{DateTime, Utc};
use ratatui::style::Color;
use serde_json::{Map, Value};
use std::fmt;

mod config;

pub use config::{
    ColorConfig, Config, DefaultsConfig, JsonColorConfig, JsonFieldConfig, PatternConfig,
};

// ============================================================================
// Log Types
// ============================================================================

/// Log severity level
///
/// Variants are declared in severity order, so the derived `Ord` sorts
/// `Error` first and `Unknown` last.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
    #[default]
    Unknown,
}

impl LogLevel {
    /// All levels in severity order
    pub const ALL: [LogLevel; 6] = [
        Self::Error,
        Self::Warn,
        Self::Info,
        Self::Debug,
        Self::Trace,
        Self::Unknown,
    ];

    /// Levels a user can filter on
    pub const FILTERABLE: [LogLevel; 5] = [
        Self::Error,
        Self::Warn,
        Self::Info,
        Self::Debug,
        Self::Trace,
    ];

    /// Normalize a level name or common alias (`err`, `warning`, `dbg`, ...)
    pub fn from_alias(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "error" | "err" | "fatal" | "critical" | "crit" => Self::Error,
            "warn" | "warning" => Self::Warn,
            "info" | "information" => Self::Info,
            "debug" | "dbg" => Self::Debug,
            "trace" | "verbose" => Self::Trace,
            _ => Self::Unknown,
        }
    }

    /// Position in the severity order (0 = most severe)
    pub fn priority(&self) -> u8 {
        match self {
            Self::Error => 0,
            Self::Warn => 1,
            Self::Info => 2,
            Self::Debug => 3,
            Self::Trace => 4,
            Self::Unknown => 5,
        }
    }

    /// Lowercase canonical name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
            Self::Unknown => "unknown",
        }
    }

    /// Short display string (3 chars)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "ERR",
            Self::Warn => "WRN",
            Self::Info => "INF",
            Self::Debug => "DBG",
            Self::Trace => "TRC",
            Self::Unknown => "???",
        }
    }

    /// Default display color for this level
    pub fn color(&self) -> Color {
        match self {
            Self::Error => Color::Red,
            Self::Warn => Color::Yellow,
            Self::Info => Color::Blue,
            Self::Debug => Color::Gray,
            Self::Trace => Color::DarkGray,
            Self::Unknown => Color::White,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a line was classified
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "text",
        }
    }
}

/// A single parsed log line
#[derive(Clone, Debug, PartialEq)]
pub struct LogRecord {
    /// Unique sequential ID, assigned by the store on insert
    pub id: u64,

    /// Original raw log line
    pub raw: String,

    /// JSON or plain text
    pub format: LogFormat,

    /// Detected log level
    pub level: LogLevel,

    /// Parsed timestamp (if available)
    pub timestamp: Option<DateTime<Utc>>,

    /// Human readable message
    pub message: Option<String>,

    /// Original JSON fields (JSON records only)
    pub metadata: Option<Map<String, Value>>,

    /// Keys consumed for level/message/timestamp extraction
    pub consumed_keys: Vec<String>,

    /// Ordinal of the source line
    pub sequence_number: u64,
}

impl LogRecord {
    /// Create a plain text record with no detected structure
    pub fn new(raw: String, sequence_number: u64) -> Self {
        Self {
            id: 0,
            message: Some(raw.clone()),
            raw,
            format: LogFormat::Text,
            level: LogLevel::Unknown,
            timestamp: None,
            metadata: None,
            consumed_keys: Vec::new(),
            sequence_number,
        }
    }

    /// The message if one was extracted, otherwise the raw line
    pub fn message_or_raw(&self) -> &str {
        self.message.as_deref().unwrap_or(&self.raw)
    }

    /// Whether this is a JSON log line
    pub fn is_json(&self) -> bool {
        self.format == LogFormat::Json
    }

    /// Metadata minus the fields already shown as level/message/timestamp
    pub fn display_metadata(&self) -> Vec<(&str, &Value)> {
        let Some(fields) = &self.metadata else {
            return Vec::new();
        };
        fields
            .iter()
            .filter(|(key, _)| !self.consumed_keys.iter().any(|c| c == *key))
            .map(|(key, value)| (key.as_str(), value))
            .collect()
    }
}

// ============================================================================
// Query Types
// ============================================================================

/// Kind of filter predicate
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterKind {
    Keyword,
    Level,
    Search,
}

/// A predicate narrowing the queryable view. Active filters AND together.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Filter {
    pub kind: FilterKind,
    pub value: String,
    pub level: Option<LogLevel>,
}

impl Filter {
    pub fn keyword(value: impl Into<String>) -> Self {
        Self {
            kind: FilterKind::Keyword,
            value: value.into(),
            level: None,
        }
    }

    pub fn level(level: LogLevel) -> Self {
        Self {
            kind: FilterKind::Level,
            value: level.name().to_string(),
            level: Some(level),
        }
    }

    pub fn search(value: impl Into<String>) -> Self {
        Self {
            kind: FilterKind::Search,
            value: value.into(),
            level: None,
        }
    }

    pub fn is_search(&self) -> bool {
        self.kind == FilterKind::Search
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FilterKind::Level => write!(f, "level:{}", self.value),
            FilterKind::Keyword => write!(f, "\"{}\"", self.value),
            FilterKind::Search => write!(f, "search:\"{}\"", self.value),
        }
    }
}

/// Sort order for queries
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    /// Insertion order
    #[default]
    Default,
    /// Ascending timestamp, untimed records first
    Timestamp,
    /// Ascending severity, error first
    Level,
}

impl SortOrder {
    /// Parse a sort name as typed by the user
    pub fn from_arg(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "timestamp" | "time" | "ts" => Some(Self::Timestamp),
            "level" | "severity" | "lvl" => Some(Self::Level),
            "default" | "chronological" | "none" => Some(Self::Default),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Timestamp => "timestamp",
            Self::Level => "level",
        }
    }
}
