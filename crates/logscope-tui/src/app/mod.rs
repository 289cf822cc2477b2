//! Viewer state, its actions and the session that ties them to the store

mod action;
mod debounce;
mod history;
mod session;
mod state;

pub use action::{SearchDirection, ViewerAction};
pub use debounce::{DETAIL_DEBOUNCE, DetailDebouncer};
pub use history::{CommandHistory, MAX_HISTORY};
pub use session::{Session, StoreStats};
pub use state::{
    DEFAULT_VIEWPORT_HEIGHT, FocusedPane, SidebarMode, StatusKind, StatusMessage, ViewerState,
};
