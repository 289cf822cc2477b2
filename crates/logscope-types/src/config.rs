//! Read-only configuration consumed by the parser, store and theme.
//!
//! Every struct is `#[serde(default)]`, so a partial file only overrides
//! the keys it names.

use serde::Deserialize;

use crate::LogLevel;

/// Top-level configuration
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub colors: ColorConfig,
    pub patterns: PatternConfig,
    pub json_fields: JsonFieldConfig,
    pub defaults: DefaultsConfig,
}

/// Color names per level, parsed by the theme
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ColorConfig {
    pub error: String,
    pub warn: String,
    pub info: String,
    pub debug: String,
    pub trace: String,
    pub unknown: String,
    pub json: JsonColorConfig,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            error: "red".into(),
            warn: "yellow".into(),
            info: "blue".into(),
            debug: "gray".into(),
            trace: "darkgray".into(),
            unknown: "white".into(),
            json: JsonColorConfig::default(),
        }
    }
}

impl ColorConfig {
    pub fn for_level(&self, level: LogLevel) -> &str {
        match level {
            LogLevel::Error => &self.error,
            LogLevel::Warn => &self.warn,
            LogLevel::Info => &self.info,
            LogLevel::Debug => &self.debug,
            LogLevel::Trace => &self.trace,
            LogLevel::Unknown => &self.unknown,
        }
    }
}

/// Colors for JSON values in the detail pane
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct JsonColorConfig {
    pub key: String,
    pub string: String,
    pub number: String,
    pub boolean: String,
    pub null: String,
    pub bracket: String,
}

impl Default for JsonColorConfig {
    fn default() -> Self {
        Self {
            key: "cyan".into(),
            string: "green".into(),
            number: "magenta".into(),
            boolean: "yellow".into(),
            null: "gray".into(),
            bracket: "white".into(),
        }
    }
}

/// Substrings that classify plain text lines, per level
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct PatternConfig {
    pub error: Vec<String>,
    pub warn: Vec<String>,
    pub info: Vec<String>,
    pub debug: Vec<String>,
    pub trace: Vec<String>,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            error: strings(&["error", "fatal", "exception", "panic", "fail"]),
            warn: strings(&["warn", "warning", "caution"]),
            info: strings(&["info", "information"]),
            debug: strings(&["debug"]),
            trace: strings(&["trace", "verbose"]),
        }
    }
}

impl PatternConfig {
    /// Pattern lists in the order they are evaluated (most severe first)
    pub fn in_severity_order(&self) -> [(LogLevel, &[String]); 5] {
        [
            (LogLevel::Error, self.error.as_slice()),
            (LogLevel::Warn, self.warn.as_slice()),
            (LogLevel::Info, self.info.as_slice()),
            (LogLevel::Debug, self.debug.as_slice()),
            (LogLevel::Trace, self.trace.as_slice()),
        ]
    }
}

/// Candidate JSON field names, in priority order
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct JsonFieldConfig {
    pub level: Vec<String>,
    pub message: Vec<String>,
    pub timestamp: Vec<String>,
}

impl Default for JsonFieldConfig {
    fn default() -> Self {
        Self {
            level: strings(&["level", "severity", "loglevel", "log_level", "lvl"]),
            message: strings(&["message", "msg", "text", "content", "body"]),
            timestamp: strings(&["timestamp", "time", "ts", "datetime", "date", "@timestamp"]),
        }
    }
}

/// Session defaults
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct DefaultsConfig {
    pub follow_mode: bool,
    pub buffer_size: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            follow_mode: true,
            buffer_size: 10_000,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [defaults]
            buffer_size = 500

            [patterns]
            error = ["boom"]
            "#,
        )
        .unwrap();

        assert_eq!(config.defaults.buffer_size, 500);
        assert!(config.defaults.follow_mode);
        assert_eq!(config.patterns.error, vec!["boom".to_string()]);
        assert_eq!(config.patterns.warn, PatternConfig::default().warn);
        assert_eq!(config.json_fields, JsonFieldConfig::default());
    }

    #[test]
    fn test_severity_order() {
        let patterns = PatternConfig::default();
        let order: Vec<LogLevel> = patterns
            .in_severity_order()
            .iter()
            .map(|(level, _)| *level)
            .collect();
        assert_eq!(order, LogLevel::FILTERABLE.to_vec());
    }
}
