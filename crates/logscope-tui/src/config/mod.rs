mod keybindings;

pub use keybindings::{KeyAction, KeyBinding, KeyBindings, KeyContext};
