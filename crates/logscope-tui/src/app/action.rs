use logscope_types::{Filter, SortOrder};

use super::state::{FocusedPane, SidebarMode, StatusMessage};

/// Direction for search result navigation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchDirection {
    Next,
    Prev,
}

/// Every transition the viewer state accepts (command pattern)
#[derive(Clone, Debug, PartialEq)]
pub enum ViewerAction {
    // Store-derived counts
    CountsUpdated { total: usize, filtered: usize },
    RecordsReceived(usize),
    ClearRecords,

    // Filtering and sorting
    AddFilter(Filter),
    ClearFilters,
    SetSort(SortOrder),

    // Search
    SetSearch(Option<String>),
    SearchMatchesUpdated(Vec<usize>),
    NavigateSearch(SearchDirection),
    ClearSearch,

    // Scrolling
    Scroll(isize),
    PageUp,
    PageDown,
    ScrollToTop,
    ScrollToBottom,
    SetViewportHeight(usize),

    // Follow / pause
    ToggleFollow,
    SetFollow(bool),
    TogglePause,

    // Selection
    MoveSelection(isize),
    Select(Option<usize>),
    /// Selected row and current match moved within the view (eviction,
    /// non-append sort); `None` when the record left the view
    PositionsShifted {
        selected: Option<usize>,
        current_match_index: Option<usize>,
    },

    // Detail sidebar
    ToggleSidebar,
    SetSidebarMode(SidebarMode),
    ToggleFullscreenDetail,
    ToggleFocus,
    SetFocus(FocusedPane),
    ScrollDetail(isize),
    DetailLayoutChanged {
        content_lines: usize,
        visible_height: usize,
    },

    // UI toggles
    ToggleHelp,
    SetHelp(bool),
    SetCommandMode(bool),
    SetStreaming(bool),
    SetStatus(Option<StatusMessage>),
}
