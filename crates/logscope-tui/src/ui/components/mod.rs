mod command_bar;
mod detail_pane;
mod help_overlay;
mod status_bar;

pub use command_bar::{CommandBar, CommandBarState};
pub use detail_pane::{DetailLayout, DetailPane, wrap};
pub use help_overlay::HelpOverlay;
pub use status_bar::{StatusBar, log_viewer_hints};
