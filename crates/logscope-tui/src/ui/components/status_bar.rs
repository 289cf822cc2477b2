use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Color,
    text::{Line, Span},
    widgets::Widget,
};

use logscope_types::LogLevel;

use crate::app::{StoreStats, ViewerState};
use crate::ui::Theme;

/// Bottom line: status message or key hints on the left, counters and
/// mode flags on the right
pub struct StatusBar<'a> {
    state: &'a ViewerState,
    hints: Vec<(&'a str, &'a str)>,
    dropped: u64,
    finished: Option<Option<i32>>,
    stats: StoreStats,
}

impl<'a> StatusBar<'a> {
    pub fn new(state: &'a ViewerState) -> Self {
        Self {
            state,
            hints: Vec::new(),
            dropped: 0,
            finished: None,
            stats: StoreStats::default(),
        }
    }

    /// Add keyboard hints as (key, description) pairs
    pub fn hints<I>(mut self, hints: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        self.hints = hints.into_iter().collect();
        self
    }

    pub fn dropped(mut self, dropped: u64) -> Self {
        self.dropped = dropped;
        self
    }

    pub fn finished(mut self, finished: Option<Option<i32>>) -> Self {
        self.finished = finished;
        self
    }

    /// Buffer occupancy, evictions and problem-level counts
    pub fn store_stats(mut self, stats: StoreStats) -> Self {
        self.stats = stats;
        self
    }

    fn left_spans(&self) -> Vec<Span<'a>> {
        if let Some(status) = &self.state.status {
            let style = if status.is_error() {
                Theme::status_bar_flag(Theme::ERROR)
            } else {
                Theme::status_bar()
            };
            return vec![Span::styled(status.text.clone(), style)];
        }

        let mut spans = Vec::new();
        for (i, (key, desc)) in self.hints.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" ", Theme::status_bar()));
            }
            spans.push(Span::styled(format!("[{key}]"), Theme::status_bar_key()));
            spans.push(Span::styled(*desc, Theme::status_bar()));
        }
        spans
    }

    fn right_spans(&self) -> Vec<Span<'static>> {
        let state = self.state;
        let mut spans = Vec::new();

        if self.dropped > 0 {
            spans.push(Span::styled(
                format!("[{} dropped] ", self.dropped),
                Theme::status_bar_flag(Theme::ERROR),
            ));
        }

        match self.finished {
            Some(Some(code)) if code != 0 => spans.push(Span::styled(
                format!("[exit {code}] "),
                Theme::status_bar_flag(Theme::ERROR),
            )),
            Some(_) => spans.push(Span::styled("[done] ", Theme::status_bar())),
            None if state.is_streaming => {
                spans.push(Span::styled("[live] ", Theme::status_bar_flag(Theme::SUCCESS)))
            }
            None => {}
        }

        if let Some(term) = &state.search_term {
            let position = match state.current_match_index {
                Some(index) => format!("{}/{}", index + 1, state.search_matches.len()),
                None => format!("{} matches", state.search_matches.len()),
            };
            spans.push(Span::styled(
                format!("/{term} {position} "),
                Theme::status_bar_flag(Theme::HIGHLIGHT),
            ));
        }

        let filters: Vec<String> = state
            .active_filters
            .iter()
            .filter(|filter| !filter.is_search())
            .map(|filter| filter.to_string())
            .collect();
        if !filters.is_empty() {
            spans.push(Span::styled(
                format!("[{}] ", filters.join(" & ")),
                Theme::status_bar_flag(Color::Cyan),
            ));
        }

        for (level, color) in [(LogLevel::Error, Theme::ERROR), (LogLevel::Warn, Color::Yellow)] {
            let n = self.stats.levels.get(level);
            if n > 0 {
                spans.push(Span::styled(
                    format!("{}:{n} ", level.as_str()),
                    Theme::status_bar_flag(color),
                ));
            }
        }

        if let Some(capacity) = self.stats.capacity {
            let evicted = match self.stats.evicted {
                0 => String::new(),
                n => format!(", {n} evicted"),
            };
            spans.push(Span::styled(
                format!("[buf {}/{capacity}{evicted}] ", state.total_count),
                Theme::status_bar(),
            ));
        }

        let mut counts = if state.filtered_count == state.total_count {
            format!("{} logs", state.total_count)
        } else {
            format!("{}/{} logs", state.filtered_count, state.total_count)
        };
        if state.total_received > state.total_count as u64 {
            counts.push_str(&format!(" ({} received)", state.total_received));
        }
        spans.push(Span::styled(counts, Theme::status_bar()));

        let mode = if state.is_paused {
            Span::styled(" PAUSED", Theme::status_bar_flag(Color::Yellow))
        } else if state.follow_mode {
            Span::styled(" FOLLOW", Theme::status_bar_flag(Theme::SUCCESS))
        } else {
            Span::styled(" ", Theme::status_bar())
        };
        spans.push(mode);
        spans
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Fill background
        buf.set_style(area, Theme::status_bar());

        let right = Line::from(self.right_spans());
        let right_width = right.width() as u16;
        let right_x = area.x + area.width.saturating_sub(right_width + 1);

        // Left side gets whatever the counters leave
        let left = Line::from(self.left_spans());
        let left_room = right_x.saturating_sub(area.x + 2);
        buf.set_line(area.x + 1, area.y, &left, left_room);

        buf.set_line(right_x, area.y, &right, right_width);
    }
}

/// Default hints for the log viewer
pub fn log_viewer_hints() -> Vec<(&'static str, &'static str)> {
    vec![
        ("/", "Cmd"),
        ("j/k", "Select"),
        ("Space", "Follow"),
        ("Enter", "Details"),
        ("?", "Help"),
        ("q", "Quit"),
    ]
}
