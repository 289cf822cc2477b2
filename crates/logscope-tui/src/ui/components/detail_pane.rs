use logscope_types::LogRecord;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use serde_json::Value;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::ui::Theme;

/// Measured layout of the detail pane after a render
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DetailLayout {
    pub content_lines: usize,
    pub visible_height: usize,
}

/// Full structured view of one record, word-wrapped to the pane width
pub struct DetailPane;

impl DetailPane {
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        record: Option<&LogRecord>,
        theme: &Theme,
        scroll: usize,
        focused: bool,
    ) -> DetailLayout {
        let inner_width = area.width.saturating_sub(2) as usize;
        let visible_height = area.height.saturating_sub(2) as usize;

        let lines = match record {
            Some(record) => Self::lines(record, theme, inner_width),
            None => vec![Line::from(Span::styled(
                "No log selected (j/k to select)",
                Theme::text_dim(),
            ))],
        };
        let content_lines = lines.len();

        let border = if focused {
            Theme::border_focused()
        } else {
            Theme::border()
        };
        let title = match record {
            Some(record) => format!(" Details #{} ", record.sequence_number),
            None => " Details ".to_string(),
        };

        let visible: Vec<Line> = lines.into_iter().skip(scroll).take(visible_height).collect();
        let widget = Paragraph::new(visible).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(Span::styled(title, Theme::title())),
        );
        frame.render_widget(widget, area);

        DetailLayout {
            content_lines,
            visible_height,
        }
    }

    /// Every display line for `record` at `width` columns
    pub fn lines(record: &LogRecord, theme: &Theme, width: usize) -> Vec<Line<'static>> {
        let width = width.max(1);
        let label = Style::default().fg(Theme::PRIMARY).add_modifier(Modifier::BOLD);
        let mut lines = Vec::new();

        lines.push(Line::from(vec![
            Span::styled("Level: ", label),
            Span::styled(
                record.level.name().to_uppercase(),
                theme.level_badge(record.level),
            ),
        ]));
        if let Some(ts) = record.timestamp {
            lines.push(Line::from(vec![
                Span::styled("Time: ", label),
                Span::styled(ts.to_rfc3339(), Theme::text()),
            ]));
        }
        lines.push(Line::from(vec![
            Span::styled("Line: ", label),
            Span::styled(record.sequence_number.to_string(), Theme::text()),
            Span::styled(format!("  ({})", record.format.as_str()), Theme::text_dim()),
        ]));

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Message", label)));
        for row in wrap(record.message_or_raw(), width) {
            lines.push(Line::from(Span::styled(row, theme.message(record.level))));
        }

        let fields = record.display_metadata();
        if !fields.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("Fields", label)));
            for (key, value) in fields {
                push_field(&mut lines, key, value, theme, width);
            }
        }

        if record.is_json() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("Raw", label)));
            for row in wrap(&record.raw, width) {
                lines.push(Line::from(Span::styled(row, Theme::text_dim())));
            }
        }

        lines
    }
}

/// `key: value`, with wrapped continuation rows indented under the value
fn push_field(lines: &mut Vec<Line<'static>>, key: &str, value: &Value, theme: &Theme, width: usize) {
    let key_text = format!("{key}: ");
    let key_width = key_text.width();
    let (text, color) = match value {
        Value::String(s) => (s.clone(), theme.json_string),
        Value::Number(n) => (n.to_string(), theme.json_number),
        Value::Bool(b) => (b.to_string(), theme.json_boolean),
        Value::Null => ("null".to_string(), theme.json_null),
        Value::Array(_) | Value::Object(_) => (
            serde_json::to_string_pretty(value).unwrap_or_default(),
            theme.json_bracket,
        ),
    };
    let value_style = Style::default().fg(color);
    let key_style = Style::default().fg(theme.json_key);

    // Too narrow to indent: key on its own row
    if key_width + 8 > width {
        lines.push(Line::from(Span::styled(key_text, key_style)));
        for row in wrap(&text, width) {
            lines.push(Line::from(Span::styled(row, value_style)));
        }
        return;
    }

    let indent = " ".repeat(key_width);
    for (i, row) in wrap(&text, width - key_width).into_iter().enumerate() {
        let lead = if i == 0 {
            Span::styled(key_text.clone(), key_style)
        } else {
            Span::raw(indent.clone())
        };
        lines.push(Line::from(vec![lead, Span::styled(row, value_style)]));
    }
}

/// Word-wrap `text` to `width` display columns
///
/// Breaks at spaces where possible and inside words that are wider than a
/// row. Embedded newlines start new rows; an empty input yields one empty
/// row.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();

    for source in text.split('\n') {
        let source = source.strip_suffix('\r').unwrap_or(source);
        let mut row = String::new();
        let mut row_width = 0;

        for word in source.split(' ') {
            let word_width = word.width();
            let gap = usize::from(!row.is_empty());

            if row_width + gap + word_width <= width {
                if gap == 1 {
                    row.push(' ');
                }
                row.push_str(word);
                row_width += gap + word_width;
                continue;
            }

            if !row.is_empty() {
                rows.push(std::mem::take(&mut row));
                row_width = 0;
            }

            // Hard-split words wider than a row
            for c in word.chars() {
                let w = c.width().unwrap_or(0);
                if row_width + w > width && !row.is_empty() {
                    rows.push(std::mem::take(&mut row));
                    row_width = 0;
                }
                row.push(c);
                row_width += w;
            }
        }
        rows.push(row);
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use logscope_logs::LogParser;

    #[test]
    fn test_wrap_breaks_at_spaces() {
        assert_eq!(wrap("the quick brown fox", 10), vec!["the quick", "brown fox"]);
        assert_eq!(wrap("", 10), vec![""]);
        assert_eq!(wrap("a\nb", 10), vec!["a", "b"]);
    }

    #[test]
    fn test_wrap_splits_long_words() {
        assert_eq!(wrap("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap("ok abcdefgh", 4), vec!["ok", "abcd", "efgh"]);
    }

    #[test]
    fn test_wrap_uses_display_width() {
        // Each CJK character occupies two columns
        assert_eq!(wrap("日本語テキスト", 6), vec!["日本語", "テキス", "ト"]);
    }

    #[test]
    fn test_narrower_pane_has_more_lines() {
        let parser = LogParser::default();
        let record = parser.parse(
            r#"{"level":"error","msg":"connection to the primary database was refused","user":"alice","attempt":3}"#,
            1,
        );
        let theme = Theme::default();

        let wide = DetailPane::lines(&record, &theme, 120);
        let narrow = DetailPane::lines(&record, &theme, 20);
        assert!(narrow.len() > wide.len());

        let text: Vec<String> = wide.iter().map(|l| l.to_string()).collect();
        assert!(text.iter().any(|l| l == "Level: ERROR"));
        assert!(text.iter().any(|l| l == "user: alice"));
        assert!(text.iter().any(|l| l == "attempt: 3"));
        // Consumed keys are not repeated as fields
        assert!(!text.iter().any(|l| l.starts_with("msg: ")));
    }

    #[test]
    fn test_text_record_has_no_fields() {
        let parser = LogParser::default();
        let record = parser.parse("WARN: disk almost full", 7);
        let text: Vec<String> = DetailPane::lines(&record, &Theme::default(), 80)
            .iter()
            .map(|l| l.to_string())
            .collect();
        assert!(text.contains(&"Level: WARN".to_string()));
        assert!(text.contains(&"WARN: disk almost full".to_string()));
        assert!(!text.contains(&"Fields".to_string()));
    }
}
