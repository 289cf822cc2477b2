use std::str::FromStr;

use logscope_types::{ColorConfig, LogLevel};
use ratatui::style::{Color, Modifier, Style};

/// Color theme for the application
///
/// Level and JSON colors come from the configuration; everything else is
/// fixed.
#[derive(Clone, Debug)]
pub struct Theme {
    levels: [Color; 6],
    pub json_key: Color,
    pub json_string: Color,
    pub json_number: Color,
    pub json_boolean: Color,
    pub json_null: Color,
    pub json_bracket: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_config(&ColorConfig::default())
    }
}

impl Theme {
    // Base colors
    pub const BG: Color = Color::Reset;
    pub const FG: Color = Color::White;
    pub const FG_DIM: Color = Color::DarkGray;

    // Accent colors
    pub const PRIMARY: Color = Color::Cyan;
    pub const HIGHLIGHT: Color = Color::Yellow;

    // Status colors
    pub const SUCCESS: Color = Color::Green;
    pub const ERROR: Color = Color::Red;

    /// Build from configured color names; unparsable names keep the default
    pub fn from_config(colors: &ColorConfig) -> Self {
        let defaults = ColorConfig::default();
        let pick = |configured: &str, fallback: &str| {
            parse_color(configured)
                .or_else(|| parse_color(fallback))
                .unwrap_or(Self::FG)
        };

        let levels = LogLevel::ALL
            .map(|level| pick(colors.for_level(level), defaults.for_level(level)));

        let json = &colors.json;
        let json_defaults = &defaults.json;
        Self {
            levels,
            json_key: pick(&json.key, &json_defaults.key),
            json_string: pick(&json.string, &json_defaults.string),
            json_number: pick(&json.number, &json_defaults.number),
            json_boolean: pick(&json.boolean, &json_defaults.boolean),
            json_null: pick(&json.null, &json_defaults.null),
            json_bracket: pick(&json.bracket, &json_defaults.bracket),
        }
    }

    pub fn level_color(&self, level: LogLevel) -> Color {
        let index = LogLevel::ALL
            .iter()
            .position(|l| *l == level)
            .unwrap_or(LogLevel::ALL.len() - 1);
        self.levels[index]
    }

    /// Three-letter level badge
    pub fn level_badge(&self, level: LogLevel) -> Style {
        Style::default()
            .fg(self.level_color(level))
            .add_modifier(Modifier::BOLD)
    }

    /// Message text: errors and warnings keep their color, the rest stay neutral
    pub fn message(&self, level: LogLevel) -> Style {
        match level {
            LogLevel::Error | LogLevel::Warn => Style::default().fg(self.level_color(level)),
            _ => Self::text(),
        }
    }

    // Border styles
    pub fn border() -> Style {
        Style::default().fg(Self::FG_DIM)
    }

    pub fn border_focused() -> Style {
        Style::default().fg(Self::PRIMARY)
    }

    // Text styles
    pub fn title() -> Style {
        Style::default()
            .fg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn text() -> Style {
        Style::default().fg(Self::FG)
    }

    pub fn text_dim() -> Style {
        Style::default().fg(Self::FG_DIM)
    }

    pub fn text_highlight() -> Style {
        Style::default()
            .fg(Self::HIGHLIGHT)
            .add_modifier(Modifier::BOLD)
    }

    // Log rows
    pub fn row_selected() -> Style {
        Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD)
    }

    pub fn search_match() -> Style {
        Style::default().fg(Color::Black).bg(Self::HIGHLIGHT)
    }

    pub fn search_match_current() -> Style {
        Style::default()
            .fg(Color::Black)
            .bg(Color::LightRed)
            .add_modifier(Modifier::BOLD)
    }

    // Status bar
    pub fn status_bar() -> Style {
        Style::default().fg(Self::FG).bg(Color::DarkGray)
    }

    pub fn status_bar_key() -> Style {
        Style::default()
            .fg(Self::HIGHLIGHT)
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    }

    pub fn status_bar_flag(color: Color) -> Style {
        Style::default()
            .fg(color)
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    }

    // Status messages
    pub fn info() -> Style {
        Style::default().fg(Self::SUCCESS)
    }

    pub fn error() -> Style {
        Style::default()
            .fg(Self::ERROR)
            .add_modifier(Modifier::BOLD)
    }
}

/// Parse a configured color name (`red`, `darkgray`, `#ff8800`, `42`)
fn parse_color(name: &str) -> Option<Color> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Color::from_str(name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_level_colors() {
        let theme = Theme::default();
        assert_eq!(theme.level_color(LogLevel::Error), Color::Red);
        assert_eq!(theme.level_color(LogLevel::Warn), Color::Yellow);
        assert_eq!(theme.level_color(LogLevel::Unknown), Color::White);
        assert_eq!(theme.json_key, Color::Cyan);
    }

    #[test]
    fn test_configured_colors_override() {
        let colors = ColorConfig {
            info: "#00ff00".into(),
            debug: "magenta".into(),
            ..ColorConfig::default()
        };
        let theme = Theme::from_config(&colors);
        assert_eq!(theme.level_color(LogLevel::Info), Color::Rgb(0, 255, 0));
        assert_eq!(theme.level_color(LogLevel::Debug), Color::Magenta);
    }

    #[test]
    fn test_unparsable_color_falls_back() {
        let colors = ColorConfig {
            error: "not a color".into(),
            trace: String::new(),
            ..ColorConfig::default()
        };
        let theme = Theme::from_config(&colors);
        assert_eq!(theme.level_color(LogLevel::Error), Color::Red);
        assert_eq!(theme.level_color(LogLevel::Trace), Color::DarkGray);
    }
}
