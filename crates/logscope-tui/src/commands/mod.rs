//! Slash command interpreter
//!
//! Text like `/filter level:error` is parsed, resolved against a static
//! registry and turned into viewer actions through a [`CommandContext`].

mod handlers;
mod parser;
mod registry;

use thiserror::Error;

use crate::app::{ViewerAction, ViewerState};

pub use parser::{ParsedCommand, parse_command};
pub use registry::{CommandDefinition, CommandRegistry, CommandResult};

/// Errors a handler can report; always surfaced as a failed result
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Unavailable(&'static str),
}

/// What a command handler can see and do
pub trait CommandContext {
    /// Apply an action to the viewer state
    fn dispatch(&mut self, action: ViewerAction);

    /// Current viewer state
    fn state(&self) -> &ViewerState;

    /// Drop every stored record
    fn clear_records(&mut self);

    /// Ask the application to exit
    fn quit(&mut self);
}

/// Handler signature: arguments after the name, then the context
pub type CommandHandler =
    fn(&[String], &mut dyn CommandContext) -> Result<Option<String>, CommandError>;
