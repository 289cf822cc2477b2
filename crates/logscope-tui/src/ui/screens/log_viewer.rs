use chrono::Local;
use logscope_logs::find_matches;
use logscope_types::LogRecord;
use ratatui::{
    Frame,
    layout::{Margin, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};
use unicode_width::UnicodeWidthChar;

use crate::app::{FocusedPane, Session, ViewerState};
use crate::ui::components::{
    CommandBar, CommandBarState, DetailLayout, DetailPane, HelpOverlay, StatusBar,
    log_viewer_hints,
};
use crate::ui::{Layout, Theme};

/// Sizes measured while drawing, fed back into the viewer state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameLayout {
    /// Log rows that fit in the list (`None` while the list is hidden)
    pub log_rows: Option<usize>,
    pub detail: Option<DetailLayout>,
}

/// Log viewer screen
pub struct LogViewerScreen;

impl LogViewerScreen {
    pub fn render(
        frame: &mut Frame,
        session: &Session,
        theme: &Theme,
        command_bar: &CommandBarState,
    ) -> FrameLayout {
        let state = session.state();
        let (content, command_area, status_area) = Layout::main(frame.area(), state.command_mode);
        let (logs_area, detail_area) = Layout::log_viewer(content, state.sidebar_mode);

        let mut layout = FrameLayout::default();

        if let Some(area) = logs_area {
            Self::render_logs(frame, area, session, theme);
            layout.log_rows = Some(Layout::inner_height(area));
        }

        if let Some(area) = detail_area {
            let focused = state.focused_pane == FocusedPane::Details;
            layout.detail = Some(DetailPane::render(
                frame,
                area,
                session.detail_record().map(|record| record.as_ref()),
                theme,
                state.detail_scroll_offset,
                focused,
            ));
        }

        if let Some(area) = command_area {
            CommandBar::render(frame, area, command_bar);
        }

        let status = StatusBar::new(state)
            .hints(log_viewer_hints())
            .dropped(session.dropped())
            .finished(session.finished())
            .store_stats(session.store_stats());
        frame.render_widget(status, status_area);

        if state.show_help {
            HelpOverlay::render(frame, &session.registry());
        }

        layout
    }

    fn render_logs(frame: &mut Frame, area: Rect, session: &Session, theme: &Theme) {
        let state = session.state();
        let records = session.visible_records();

        // Borders and scrollbar
        let inner_width = area.width.saturating_sub(3) as usize;
        let term = state.search_term.as_deref();

        let lines: Vec<Line> = records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let position = state.scroll_offset + i;
                Self::format_row(record, position, state, term, theme, inner_width)
            })
            .collect();

        let title = if state.filtered_count == state.total_count {
            format!(" Logs ({}) ", state.total_count)
        } else {
            format!(" Logs ({} matching) ", state.filtered_count)
        };
        let border = if state.focused_pane == FocusedPane::Logs {
            Theme::border_focused()
        } else {
            Theme::border()
        };

        let logs_widget = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(Span::styled(title, Theme::title())),
        );
        frame.render_widget(logs_widget, area);

        // Render scrollbar
        let max_scroll = state.max_scroll();
        if max_scroll > 0 {
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("▲"))
                .end_symbol(Some("▼"));
            let mut scrollbar_state = ScrollbarState::default()
                .content_length(max_scroll)
                .position(state.scroll_offset);

            frame.render_stateful_widget(
                scrollbar,
                area.inner(Margin {
                    vertical: 1,
                    horizontal: 0,
                }),
                &mut scrollbar_state,
            );
        }
    }

    /// One list row: marker, line number, level badge, time, message
    fn format_row(
        record: &LogRecord,
        position: usize,
        state: &ViewerState,
        term: Option<&str>,
        theme: &Theme,
        width: usize,
    ) -> Line<'static> {
        let selected = state.selected_index == Some(position);
        let is_current_match = state.current_match() == Some(position);

        let marker = if selected { "▶" } else { " " };
        let mut spans = vec![
            Span::styled(marker, Theme::text_highlight()),
            Span::styled(format!("{:>6} ", record.sequence_number), Theme::text_dim()),
            Span::styled(format!("{} ", record.level.as_str()), theme.level_badge(record.level)),
        ];
        if let Some(ts) = record.timestamp {
            spans.push(Span::styled(
                ts.with_timezone(&Local).format("%H:%M:%S ").to_string(),
                Theme::text_dim(),
            ));
        }

        let prefix_width: usize = spans.iter().map(|span| span.width()).sum();
        let message = truncate_to_width(
            &single_line(record.message_or_raw()),
            width.saturating_sub(prefix_width),
        );

        let base = theme.message(record.level);
        let highlight = if is_current_match {
            Theme::search_match_current()
        } else {
            Theme::search_match()
        };
        spans.extend(highlight_spans(&message, term, base, highlight));

        let line = Line::from(spans);
        if selected {
            line.style(Theme::row_selected())
        } else {
            line
        }
    }
}

/// Split `text` into spans, styling each occurrence of `term`
fn highlight_spans(
    text: &str,
    term: Option<&str>,
    base: Style,
    highlight: Style,
) -> Vec<Span<'static>> {
    let ranges = term.map(|t| find_matches(text, t)).unwrap_or_default();

    let mut spans = Vec::new();
    let mut cursor = 0;
    for (start, end) in ranges {
        let (Some(before), Some(matched)) = (text.get(cursor..start), text.get(start..end)) else {
            continue;
        };
        if !before.is_empty() {
            spans.push(Span::styled(before.to_string(), base));
        }
        spans.push(Span::styled(matched.to_string(), highlight));
        cursor = end;
    }
    if let Some(rest) = text.get(cursor..) {
        if !rest.is_empty() {
            spans.push(Span::styled(rest.to_string(), base));
        }
    }
    spans
}

/// Control characters (newlines, tabs) would break the row layout
fn single_line(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

/// Longest prefix of `text` that fits in `width` display columns
fn truncate_to_width(text: &str, width: usize) -> String {
    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Color;

    fn contents(spans: &[Span<'_>]) -> Vec<String> {
        spans.iter().map(|s| s.content.to_string()).collect()
    }

    #[test]
    fn test_highlight_splits_matches() {
        let base = Style::default();
        let hl = Style::default().bg(Color::Yellow);
        let spans = highlight_spans("DB timeout talking to db", Some("db"), base, hl);
        assert_eq!(contents(&spans), vec!["DB", " timeout talking to ", "db"]);
        assert_eq!(spans[0].style, hl);
        assert_eq!(spans[1].style, base);
    }

    #[test]
    fn test_highlight_without_term() {
        let spans = highlight_spans("plain", None, Style::default(), Style::default());
        assert_eq!(contents(&spans), vec!["plain"]);
    }

    #[test]
    fn test_truncate_respects_wide_chars() {
        assert_eq!(truncate_to_width("hello world", 5), "hello");
        assert_eq!(truncate_to_width("日本語", 5), "日本");
        assert_eq!(truncate_to_width("abc", 0), "");
    }

    #[test]
    fn test_single_line_replaces_controls() {
        assert_eq!(single_line("a\tb\nc"), "a b c");
    }

    #[test]
    fn test_row_marks_selection() {
        let mut record = LogRecord::new("request ok".to_string(), 42);
        record.level = logscope_types::LogLevel::Info;
        let state = ViewerState::default()
            .reduce(&crate::app::ViewerAction::CountsUpdated {
                total: 10,
                filtered: 10,
            })
            .reduce(&crate::app::ViewerAction::Select(Some(3)));

        let line = LogViewerScreen::format_row(&record, 3, &state, None, &Theme::default(), 80);
        let text = line.to_string();
        assert!(text.starts_with("▶"));
        assert!(text.contains("    42 INF request ok"));

        let other = LogViewerScreen::format_row(&record, 4, &state, None, &Theme::default(), 80);
        assert!(other.to_string().starts_with(' '));
    }
}
