//! TUI components for logscope
//!
//! This crate provides the terminal user interface for logscope,
//! including the viewer state machine, the command interpreter,
//! keybindings, event handling, and UI components.

pub mod app;
pub mod commands;
pub mod config;
pub mod tui;
pub mod ui;

pub use app::{
    CommandHistory, DetailDebouncer, FocusedPane, SearchDirection, Session, SidebarMode,
    StatusMessage, StoreStats, ViewerAction, ViewerState,
};
pub use commands::{CommandContext, CommandError, CommandRegistry, CommandResult, parse_command};
pub use config::{KeyAction, KeyBinding, KeyBindings, KeyContext};
pub use tui::{Event, EventHandler, Tui, install_panic_hook};
pub use ui::components::{
    CommandBar, CommandBarState, DetailLayout, DetailPane, HelpOverlay, StatusBar,
};
pub use ui::screens::{FrameLayout, LogViewerScreen};
pub use ui::{Layout, Theme};
