mod log_viewer;

pub use log_viewer::{FrameLayout, LogViewerScreen};
