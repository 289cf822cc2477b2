use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde_json::{Map, Value};

use logscope_types::{Config, JsonFieldConfig, LogFormat, LogLevel, LogRecord};

/// Epoch values above this are treated as milliseconds
const EPOCH_MILLIS_THRESHOLD: f64 = 1e12;

/// Date-time layouts tried after RFC 3339 / RFC 2822
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];

/// Log parser for extracting structure from raw log lines
///
/// Built once from the configuration; `parse` never fails. Anything that
/// cannot be understood as a JSON object is classified as plain text.
pub struct LogParser {
    /// Compiled text patterns, most severe level first
    patterns: Vec<(LogLevel, Regex)>,

    /// Lowercased JSON candidate field names
    level_fields: Vec<String>,
    message_fields: Vec<String>,
    timestamp_fields: Vec<String>,
}

impl LogParser {
    /// Create a parser from the pattern and JSON field configuration
    pub fn new(config: &Config) -> Self {
        let patterns = config
            .patterns
            .in_severity_order()
            .into_iter()
            .filter_map(|(level, words)| compile_patterns(level, words).map(|re| (level, re)))
            .collect();

        let JsonFieldConfig {
            level,
            message,
            timestamp,
        } = &config.json_fields;

        Self {
            patterns,
            level_fields: lowercase_all(level),
            message_fields: lowercase_all(message),
            timestamp_fields: lowercase_all(timestamp),
        }
    }

    /// Parse a raw log line into a LogRecord
    pub fn parse(&self, raw: &str, sequence_number: u64) -> LogRecord {
        let mut record = LogRecord::new(raw.to_string(), sequence_number);

        if let Some(fields) = Self::try_parse_json(raw) {
            self.apply_json(&mut record, fields);
        } else {
            let (timestamp, content) = Self::extract_timestamp_prefix(raw);
            record.timestamp = timestamp;
            record.level = self.extract_level_from_text(content);
        }

        record
    }

    /// Try to parse a whole line as a JSON object
    fn try_parse_json(raw: &str) -> Option<Map<String, Value>> {
        let trimmed = raw.trim();
        if !trimmed.starts_with('{') || !trimmed.ends_with('}') {
            return None;
        }

        match serde_json::from_str::<Value>(trimmed).ok()? {
            Value::Object(fields) => Some(fields),
            _ => None,
        }
    }

    fn apply_json(&self, record: &mut LogRecord, fields: Map<String, Value>) {
        record.format = LogFormat::Json;
        record.message = None;

        if let Some((key, level)) = self.extract_level_from_json(&fields) {
            record.level = level;
            record.consumed_keys.push(key);
        }

        if let Some((key, message)) =
            find_field(&fields, &self.message_fields, |v| v.as_str().map(str::to_string))
        {
            record.message = Some(message);
            record.consumed_keys.push(key);
        }

        if let Some((key, timestamp)) =
            find_field(&fields, &self.timestamp_fields, parse_timestamp_value)
        {
            record.timestamp = Some(timestamp);
            record.consumed_keys.push(key);
        }

        record.metadata = Some(fields);
    }

    /// Extract log level from JSON fields
    ///
    /// Strings go through the alias table. Numbers are stringified first,
    /// then fall back to the pino/bunyan numeric scale.
    fn extract_level_from_json(&self, fields: &Map<String, Value>) -> Option<(String, LogLevel)> {
        find_field(fields, &self.level_fields, |value| {
            let level = match value {
                Value::String(s) => LogLevel::from_alias(s),
                Value::Number(n) => match LogLevel::from_alias(&n.to_string()) {
                    LogLevel::Unknown => n.as_u64().map_or(LogLevel::Unknown, numeric_level),
                    level => level,
                },
                _ => LogLevel::Unknown,
            };
            (level != LogLevel::Unknown).then_some(level)
        })
    }

    /// Extract log level from plain text patterns
    fn extract_level_from_text(&self, content: &str) -> LogLevel {
        self.patterns
            .iter()
            .find(|(_, re)| re.is_match(content))
            .map(|(level, _)| *level)
            .unwrap_or(LogLevel::Unknown)
    }

    /// Extract an RFC 3339 timestamp from the beginning of a line
    fn extract_timestamp_prefix(raw: &str) -> (Option<DateTime<Utc>>, &str) {
        // Shortest form: 2024-01-15T10:30:00Z (20 chars)
        if raw.len() < 20 {
            return (None, raw);
        }

        let search_end = Self::floor_char_boundary(raw, 40.min(raw.len()));
        let Some(prefix) = raw.get(..search_end) else {
            return (None, raw);
        };
        let end = prefix.find(char::is_whitespace).unwrap_or(prefix.len());

        match DateTime::parse_from_rfc3339(&raw[..end]) {
            Ok(ts) => (Some(ts.with_timezone(&Utc)), raw[end..].trim_start()),
            Err(_) => (None, raw),
        }
    }

    /// Find the largest valid char boundary <= the given byte index
    fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
        if idx >= s.len() {
            return s.len();
        }
        while idx > 0 && !s.is_char_boundary(idx) {
            idx -= 1;
        }
        idx
    }
}

impl Default for LogParser {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

/// First candidate key (case-insensitive, in candidate order) whose value
/// `extract` accepts
fn find_field<T>(
    fields: &Map<String, Value>,
    candidates: &[String],
    extract: impl Fn(&Value) -> Option<T>,
) -> Option<(String, T)> {
    candidates.iter().find_map(|candidate| {
        fields
            .iter()
            .filter(|(key, _)| key.to_lowercase() == *candidate)
            .find_map(|(key, value)| extract(value).map(|found| (key.clone(), found)))
    })
}

/// Build a single case-insensitive alternation for one level's patterns
fn compile_patterns(level: LogLevel, words: &[String]) -> Option<Regex> {
    let alternatives: Vec<String> = words
        .iter()
        .filter(|w| !w.is_empty())
        .map(|w| regex::escape(w))
        .collect();
    if alternatives.is_empty() {
        return None;
    }

    let pattern = format!("(?i){}", alternatives.join("|"));
    match Regex::new(&pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(%level, error = %e, "Skipping invalid level pattern");
            None
        }
    }
}

fn lowercase_all(items: &[String]) -> Vec<String> {
    items.iter().map(|s| s.to_lowercase()).collect()
}

/// pino/bunyan numeric levels
fn numeric_level(n: u64) -> LogLevel {
    match n {
        0..=10 => LogLevel::Trace,
        11..=20 => LogLevel::Debug,
        21..=30 => LogLevel::Info,
        31..=40 => LogLevel::Warn,
        _ => LogLevel::Error,
    }
}

/// Derive an instant from a JSON timestamp field
fn parse_timestamp_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_f64().and_then(from_epoch),
        Value::String(s) => parse_timestamp_str(s),
        _ => None,
    }
}

/// Parse a timestamp string with the general date heuristics
pub fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(n) = s.parse::<f64>() {
        return from_epoch(n);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_rfc2822(s) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Epoch seconds or milliseconds, decided by magnitude
fn from_epoch(n: f64) -> Option<DateTime<Utc>> {
    if !n.is_finite() {
        return None;
    }
    let millis = if n > EPOCH_MILLIS_THRESHOLD {
        n
    } else {
        n * 1000.0
    };
    if millis.abs() > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_millis(millis as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use logscope_types::PatternConfig;

    fn parse(line: &str) -> LogRecord {
        LogParser::default().parse(line, 1)
    }

    #[test]
    fn test_parse_json_log() {
        let record = parse(r#"{"level":"error","msg":"boom","ts":1700000000}"#);
        assert_eq!(record.format, LogFormat::Json);
        assert_eq!(record.level, LogLevel::Error);
        assert_eq!(record.message.as_deref(), Some("boom"));
        assert_eq!(
            record.timestamp.map(|t| t.to_rfc3339()),
            Some("2023-11-14T22:13:20+00:00".to_string())
        );
        assert!(record.display_metadata().is_empty());
    }

    #[test]
    fn test_parse_json_millis_and_case_insensitive_keys() {
        let record = parse(r#"{"Severity":"WARNING","Message":"slow","Time":1700000000000}"#);
        assert_eq!(record.level, LogLevel::Warn);
        assert_eq!(record.message.as_deref(), Some("slow"));
        assert_eq!(record.timestamp.map(|t| t.timestamp()), Some(1_700_000_000));
        assert_eq!(record.consumed_keys, vec!["Severity", "Message", "Time"]);
    }

    #[test]
    fn test_parse_json_numeric_level() {
        let record = parse(r#"{"level":30,"msg":"started"}"#);
        assert_eq!(record.level, LogLevel::Info);

        let record = parse(r#"{"level":50,"msg":"crashed"}"#);
        assert_eq!(record.level, LogLevel::Error);
    }

    #[test]
    fn test_first_known_level_field_wins() {
        let record = parse(r#"{"level":"nonsense","severity":"debug"}"#);
        assert_eq!(record.level, LogLevel::Debug);
        assert_eq!(record.consumed_keys, vec!["severity"]);
    }

    #[test]
    fn test_json_message_must_be_string() {
        let record = parse(r#"{"msg":42,"text":"fallback","user":"a"}"#);
        assert_eq!(record.message.as_deref(), Some("fallback"));
        let shown: Vec<&str> = record.display_metadata().iter().map(|(k, _)| *k).collect();
        assert_eq!(shown, vec!["msg", "user"]);
    }

    #[test]
    fn test_json_string_timestamps() {
        let record = parse(r#"{"timestamp":"2024-01-15 10:30:00","msg":"x"}"#);
        assert_eq!(
            record.timestamp.map(|t| t.to_rfc3339()),
            Some("2024-01-15T10:30:00+00:00".to_string())
        );

        let record = parse(r#"{"@timestamp":"2024-01-15","msg":"x"}"#);
        assert!(record.timestamp.is_some());

        let record = parse(r#"{"ts":"yesterday","msg":"x"}"#);
        assert!(record.timestamp.is_none());
    }

    #[test]
    fn test_invalid_json_falls_back_to_text() {
        let record = parse(r#"{"level":"error", broken"#);
        assert_eq!(record.format, LogFormat::Text);
        assert_eq!(record.level, LogLevel::Error);

        let record = parse("[1, 2, 3]");
        assert_eq!(record.format, LogFormat::Text);
    }

    #[test]
    fn test_parse_text_level() {
        let record = parse("WARN: disk almost full");
        assert_eq!(record.format, LogFormat::Text);
        assert_eq!(record.level, LogLevel::Warn);
        assert_eq!(record.message.as_deref(), Some("WARN: disk almost full"));
    }

    #[test]
    fn test_text_severity_order() {
        assert_eq!(parse("info: request failed").level, LogLevel::Error);
        assert_eq!(parse("verbose output").level, LogLevel::Trace);
        assert_eq!(parse("nothing to see").level, LogLevel::Unknown);
    }

    #[test]
    fn test_custom_patterns() {
        let config = Config {
            patterns: PatternConfig {
                error: vec!["kaput".into()],
                ..PatternConfig::default()
            },
            ..Config::default()
        };
        let parser = LogParser::new(&config);
        assert_eq!(parser.parse("engine KAPUT", 1).level, LogLevel::Error);
        assert_eq!(parser.parse("an error", 1).level, LogLevel::Unknown);
    }

    #[test]
    fn test_parse_timestamp_prefix() {
        let record = parse("2024-01-15T10:30:00.123456789Z some log message");
        assert!(record.timestamp.is_some());
        assert_eq!(record.raw, "2024-01-15T10:30:00.123456789Z some log message");
    }

    #[test]
    fn test_parse_multibyte_utf8_no_panic() {
        let record = parse("─────────────────────────────────────────");
        assert!(record.timestamp.is_none());

        let record = parse("2024-01-15T10:30:00Z ╭────────────────────────────╮");
        assert!(record.timestamp.is_some());
    }
}
