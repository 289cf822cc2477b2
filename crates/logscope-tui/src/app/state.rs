use logscope_types::{Filter, SortOrder};

use super::action::{SearchDirection, ViewerAction};

/// Default number of visible log rows before the first layout pass
pub const DEFAULT_VIEWPORT_HEIGHT: usize = 20;

/// Which pane receives navigation keys
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FocusedPane {
    #[default]
    Logs,
    Details,
}

/// Detail sidebar visibility
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SidebarMode {
    #[default]
    Hidden,
    Visible,
    Fullscreen,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

/// A one-line message shown in the status bar
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            text: text.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == StatusKind::Error
    }
}

/// Navigation, search and layout state of the log viewer
///
/// Only `reduce` changes it, and every offset it exposes has already been
/// clamped against the current counts and layout.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewerState {
    /// First visible row of the filtered view
    pub scroll_offset: usize,
    pub viewport_height: usize,

    /// Keep the newest records in view
    pub follow_mode: bool,
    /// Suspend bottom tracking without leaving follow mode
    pub is_paused: bool,

    /// Selected row of the filtered view
    pub selected_index: Option<usize>,
    pub focused_pane: FocusedPane,

    pub sidebar_mode: SidebarMode,
    pub detail_scroll_offset: usize,
    pub detail_content_lines: usize,
    pub detail_visible_height: usize,

    pub search_term: Option<String>,
    /// Positions in the filtered, sorted view
    pub search_matches: Vec<usize>,
    /// Index into `search_matches`; `None` before the first navigation
    pub current_match_index: Option<usize>,

    pub active_filters: Vec<Filter>,
    pub sort_by: SortOrder,

    /// Records currently stored
    pub total_count: usize,
    /// Records matching the active filters
    pub filtered_count: usize,
    /// Records ever appended, survives clear
    pub total_received: u64,

    pub command_mode: bool,
    pub show_help: bool,
    pub is_streaming: bool,
    pub status: Option<StatusMessage>,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ViewerState {
    pub fn new(follow_mode: bool) -> Self {
        Self {
            scroll_offset: 0,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            follow_mode,
            is_paused: false,
            selected_index: None,
            focused_pane: FocusedPane::Logs,
            sidebar_mode: SidebarMode::Hidden,
            detail_scroll_offset: 0,
            detail_content_lines: 0,
            detail_visible_height: 0,
            search_term: None,
            search_matches: Vec::new(),
            current_match_index: None,
            active_filters: Vec::new(),
            sort_by: SortOrder::Default,
            total_count: 0,
            filtered_count: 0,
            total_received: 0,
            command_mode: false,
            show_help: false,
            is_streaming: false,
            status: None,
        }
    }

    /// Apply one action and return the renormalized next state
    pub fn reduce(mut self, action: &ViewerAction) -> Self {
        let previous_selection = self.selected_index;

        match action {
            ViewerAction::CountsUpdated { total, filtered } => {
                self.total_count = *total;
                self.filtered_count = *filtered;
            }
            ViewerAction::RecordsReceived(count) => {
                self.total_received += *count as u64;
            }
            ViewerAction::ClearRecords => {
                self.total_count = 0;
                self.filtered_count = 0;
                self.scroll_offset = 0;
                self.selected_index = None;
                self.detail_scroll_offset = 0;
                self.invalidate_matches();
            }

            ViewerAction::AddFilter(filter) => {
                if !self.active_filters.contains(filter) {
                    self.active_filters.push(filter.clone());
                }
                self.reset_view_position();
            }
            ViewerAction::ClearFilters => {
                self.active_filters.retain(Filter::is_search);
                self.reset_view_position();
            }
            ViewerAction::SetSort(sort) => {
                if self.sort_by != *sort {
                    self.sort_by = *sort;
                    self.selected_index = None;
                    self.invalidate_matches();
                }
            }

            ViewerAction::SetSearch(term) => match term.as_deref().map(str::trim) {
                Some(term) if !term.is_empty() => {
                    self.search_term = Some(term.to_string());
                    self.invalidate_matches();
                    self.follow_mode = false;
                }
                _ => self.clear_search(),
            },
            ViewerAction::SearchMatchesUpdated(matches) => {
                self.search_matches = matches.clone();
                self.current_match_index = self
                    .current_match_index
                    .filter(|index| *index < self.search_matches.len());
            }
            ViewerAction::NavigateSearch(direction) => self.navigate_search(*direction),
            ViewerAction::ClearSearch => self.clear_search(),

            ViewerAction::Scroll(delta) => {
                self.follow_mode = false;
                self.scroll_offset = offset_by(self.scroll_offset, *delta);
            }
            ViewerAction::PageUp => {
                self.follow_mode = false;
                self.scroll_offset = self.scroll_offset.saturating_sub(self.viewport_height);
            }
            ViewerAction::PageDown => {
                self.follow_mode = false;
                self.scroll_offset = self.scroll_offset.saturating_add(self.viewport_height);
            }
            ViewerAction::ScrollToTop => {
                self.follow_mode = false;
                self.scroll_offset = 0;
            }
            ViewerAction::ScrollToBottom => self.enable_follow(),
            ViewerAction::SetViewportHeight(height) => {
                self.viewport_height = (*height).max(1);
            }

            ViewerAction::ToggleFollow => {
                if self.follow_mode {
                    self.follow_mode = false;
                } else {
                    self.enable_follow();
                }
            }
            ViewerAction::SetFollow(true) => self.enable_follow(),
            ViewerAction::SetFollow(false) => self.follow_mode = false,
            ViewerAction::TogglePause => self.is_paused = !self.is_paused,

            ViewerAction::MoveSelection(delta) => self.move_selection(*delta),
            ViewerAction::Select(index) => {
                self.follow_mode = false;
                self.selected_index = index.map(|i| i.min(self.filtered_count.saturating_sub(1)));
                self.reveal_selection();
            }
            ViewerAction::PositionsShifted {
                selected,
                current_match_index,
            } => {
                self.selected_index = *selected;
                self.current_match_index =
                    current_match_index.filter(|index| *index < self.search_matches.len());
            }

            ViewerAction::ToggleSidebar => {
                let mode = match self.sidebar_mode {
                    SidebarMode::Hidden => SidebarMode::Visible,
                    SidebarMode::Visible | SidebarMode::Fullscreen => SidebarMode::Hidden,
                };
                self.set_sidebar_mode(mode);
            }
            ViewerAction::SetSidebarMode(mode) => self.set_sidebar_mode(*mode),
            ViewerAction::ToggleFullscreenDetail => match self.sidebar_mode {
                SidebarMode::Hidden => {}
                SidebarMode::Visible => self.set_sidebar_mode(SidebarMode::Fullscreen),
                SidebarMode::Fullscreen => self.set_sidebar_mode(SidebarMode::Visible),
            },
            ViewerAction::ToggleFocus => {
                if self.sidebar_mode != SidebarMode::Hidden {
                    self.focused_pane = match self.focused_pane {
                        FocusedPane::Logs => FocusedPane::Details,
                        FocusedPane::Details => FocusedPane::Logs,
                    };
                }
            }
            ViewerAction::SetFocus(pane) => {
                if self.sidebar_mode != SidebarMode::Hidden || *pane == FocusedPane::Logs {
                    self.focused_pane = *pane;
                }
            }
            ViewerAction::ScrollDetail(delta) => {
                self.detail_scroll_offset = offset_by(self.detail_scroll_offset, *delta);
            }
            ViewerAction::DetailLayoutChanged {
                content_lines,
                visible_height,
            } => {
                self.detail_content_lines = *content_lines;
                self.detail_visible_height = *visible_height;
            }

            ViewerAction::ToggleHelp => self.show_help = !self.show_help,
            ViewerAction::SetHelp(show) => self.show_help = *show,
            ViewerAction::SetCommandMode(active) => self.command_mode = *active,
            ViewerAction::SetStreaming(streaming) => self.is_streaming = *streaming,
            ViewerAction::SetStatus(status) => self.status = status.clone(),
        }

        if self.selected_index != previous_selection {
            self.detail_scroll_offset = 0;
        }
        self.normalize();
        self
    }

    // ========================================================================
    // Derived values
    // ========================================================================

    /// Largest valid scroll offset for the filtered view
    pub fn max_scroll(&self) -> usize {
        self.filtered_count.saturating_sub(self.viewport_height)
    }

    pub fn max_detail_scroll(&self) -> usize {
        self.detail_content_lines
            .saturating_sub(self.detail_visible_height)
    }

    /// Whether the view is currently pinned to the newest records
    pub fn is_tracking_bottom(&self) -> bool {
        self.follow_mode && !self.is_paused
    }

    /// Range of filtered positions on screen
    pub fn visible_range(&self) -> std::ops::Range<usize> {
        let end = (self.scroll_offset + self.viewport_height).min(self.filtered_count);
        self.scroll_offset..end.max(self.scroll_offset)
    }

    /// The match position currently navigated to
    pub fn current_match(&self) -> Option<usize> {
        self.current_match_index
            .and_then(|index| self.search_matches.get(index).copied())
    }

    pub fn is_match(&self, position: usize) -> bool {
        self.search_matches.binary_search(&position).is_ok()
    }

    pub fn has_search(&self) -> bool {
        self.search_term.is_some()
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    fn enable_follow(&mut self) {
        self.follow_mode = true;
        self.is_paused = false;
        self.selected_index = None;
        self.scroll_offset = self.max_scroll();
    }

    fn clear_search(&mut self) {
        self.search_term = None;
        self.active_filters.retain(|filter| !filter.is_search());
        self.invalidate_matches();
    }

    fn invalidate_matches(&mut self) {
        self.search_matches.clear();
        self.current_match_index = None;
    }

    /// The filtered view changed shape; old positions mean nothing
    fn reset_view_position(&mut self) {
        if !self.follow_mode {
            self.scroll_offset = 0;
        }
        self.selected_index = None;
        self.invalidate_matches();
    }

    fn navigate_search(&mut self, direction: SearchDirection) {
        let count = self.search_matches.len();
        if count == 0 {
            return;
        }

        let index = match (self.current_match_index, direction) {
            (None, SearchDirection::Next) => 0,
            (None, SearchDirection::Prev) => count - 1,
            (Some(i), SearchDirection::Next) => (i + 1) % count,
            (Some(i), SearchDirection::Prev) => (i + count - 1) % count,
        };

        let position = self.search_matches[index];
        self.current_match_index = Some(index);
        self.selected_index = Some(position);
        self.follow_mode = false;
        self.scroll_offset = position.saturating_sub(self.viewport_height / 2);
    }

    fn move_selection(&mut self, delta: isize) {
        self.follow_mode = false;
        if self.filtered_count == 0 {
            return;
        }

        let last = self.filtered_count - 1;
        let next = match self.selected_index {
            None if delta < 0 => {
                let bottom = self.scroll_offset + self.viewport_height.saturating_sub(1);
                bottom.min(last)
            }
            None => self.scroll_offset.min(last),
            Some(current) => offset_by(current, delta).min(last),
        };

        self.selected_index = Some(next);
        self.reveal_selection();
    }

    /// Scroll the minimum needed to keep the selection on screen
    fn reveal_selection(&mut self) {
        let Some(selected) = self.selected_index else {
            return;
        };
        if selected < self.scroll_offset {
            self.scroll_offset = selected;
        } else if selected >= self.scroll_offset + self.viewport_height {
            self.scroll_offset = selected + 1 - self.viewport_height;
        }
    }

    fn set_sidebar_mode(&mut self, mode: SidebarMode) {
        if mode != self.sidebar_mode {
            self.detail_scroll_offset = 0;
        }
        self.sidebar_mode = mode;
        match mode {
            SidebarMode::Hidden => self.focused_pane = FocusedPane::Logs,
            SidebarMode::Fullscreen => self.focused_pane = FocusedPane::Details,
            SidebarMode::Visible => {}
        }
    }

    /// Re-establish every bound after a transition
    fn normalize(&mut self) {
        self.viewport_height = self.viewport_height.max(1);

        if self.is_tracking_bottom() {
            self.scroll_offset = self.max_scroll();
        }
        self.scroll_offset = self.scroll_offset.min(self.max_scroll());

        self.selected_index = match self.selected_index {
            _ if self.filtered_count == 0 => None,
            Some(index) => Some(index.min(self.filtered_count - 1)),
            None => None,
        };

        self.detail_scroll_offset = self.detail_scroll_offset.min(self.max_detail_scroll());

        if self.sidebar_mode == SidebarMode::Hidden {
            self.focused_pane = FocusedPane::Logs;
        }
    }
}

fn offset_by(value: usize, delta: isize) -> usize {
    if delta < 0 {
        value.saturating_sub(delta.unsigned_abs())
    } else {
        value.saturating_add(delta as usize)
    }
}
