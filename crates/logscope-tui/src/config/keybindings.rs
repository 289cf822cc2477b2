use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

use crate::app::{SearchDirection, ViewerAction};

/// A key combination
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn ctrl(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    /// Build from a terminal event
    ///
    /// Shift is dropped for characters since the character itself already
    /// carries the case (`G` arrives as `Char('G')` + SHIFT on most
    /// terminals, and without SHIFT on some).
    pub fn from_event(event: &KeyEvent) -> Self {
        let modifiers = match event.code {
            KeyCode::Char(_) => event.modifiers.difference(KeyModifiers::SHIFT),
            _ => event.modifiers,
        };
        Self {
            code: event.code,
            modifiers,
        }
    }
}

/// Context for keybindings
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyContext {
    Global,
    LogViewer,
    DetailPane,
    CommandInput,
}

/// What a key press asks for
#[derive(Clone, Debug, PartialEq)]
pub enum KeyAction {
    /// Forwarded to the viewer state unchanged
    Viewer(ViewerAction),
    /// Scroll the detail pane by whole pages (sign is the direction)
    DetailPage(isize),
    EnterCommandMode,
    Quit,

    // Command input
    Submit,
    Cancel,
    Backspace,
    ClearInput,
    HistoryPrevious,
    HistoryNext,
    Complete,
    Input(char),
}

/// Keybinding configuration
pub struct KeyBindings {
    bindings: HashMap<KeyContext, HashMap<KeyBinding, KeyAction>>,
}

impl KeyBindings {
    pub fn new() -> Self {
        use KeyAction::Viewer;

        let mut bindings = HashMap::new();

        // Global bindings
        let mut global = HashMap::new();
        global.insert(KeyBinding::new(KeyCode::Char('?')), Viewer(ViewerAction::ToggleHelp));
        global.insert(KeyBinding::new(KeyCode::Char('/')), KeyAction::EnterCommandMode);
        global.insert(KeyBinding::new(KeyCode::Char(':')), KeyAction::EnterCommandMode);
        global.insert(KeyBinding::new(KeyCode::Tab), Viewer(ViewerAction::ToggleFocus));
        global.insert(KeyBinding::new(KeyCode::Enter), Viewer(ViewerAction::ToggleSidebar));
        global.insert(KeyBinding::new(KeyCode::Char('d')), Viewer(ViewerAction::ToggleSidebar));
        global.insert(
            KeyBinding::new(KeyCode::Char('F')),
            Viewer(ViewerAction::ToggleFullscreenDetail),
        );
        global.insert(KeyBinding::new(KeyCode::Char('q')), KeyAction::Quit);
        global.insert(KeyBinding::new(KeyCode::Esc), KeyAction::Quit);
        global.insert(KeyBinding::ctrl(KeyCode::Char('c')), KeyAction::Quit);
        bindings.insert(KeyContext::Global, global);

        // Log viewer bindings - less-like navigation
        let mut log_viewer = HashMap::new();
        // Selection
        log_viewer.insert(KeyBinding::new(KeyCode::Char('j')), Viewer(ViewerAction::MoveSelection(1)));
        log_viewer.insert(KeyBinding::new(KeyCode::Down), Viewer(ViewerAction::MoveSelection(1)));
        log_viewer.insert(KeyBinding::new(KeyCode::Char('k')), Viewer(ViewerAction::MoveSelection(-1)));
        log_viewer.insert(KeyBinding::new(KeyCode::Up), Viewer(ViewerAction::MoveSelection(-1)));
        // Line scrolling without touching the selection
        log_viewer.insert(KeyBinding::ctrl(KeyCode::Char('e')), Viewer(ViewerAction::Scroll(1)));
        log_viewer.insert(KeyBinding::ctrl(KeyCode::Char('y')), Viewer(ViewerAction::Scroll(-1)));
        // Page navigation (less-style)
        log_viewer.insert(KeyBinding::ctrl(KeyCode::Char('f')), Viewer(ViewerAction::PageDown));
        log_viewer.insert(KeyBinding::ctrl(KeyCode::Char('b')), Viewer(ViewerAction::PageUp));
        log_viewer.insert(KeyBinding::ctrl(KeyCode::Char('d')), Viewer(ViewerAction::PageDown));
        log_viewer.insert(KeyBinding::ctrl(KeyCode::Char('u')), Viewer(ViewerAction::PageUp));
        log_viewer.insert(KeyBinding::new(KeyCode::PageDown), Viewer(ViewerAction::PageDown));
        log_viewer.insert(KeyBinding::new(KeyCode::PageUp), Viewer(ViewerAction::PageUp));
        // Top/bottom navigation (less-style)
        log_viewer.insert(KeyBinding::new(KeyCode::Char('g')), Viewer(ViewerAction::ScrollToTop));
        log_viewer.insert(KeyBinding::new(KeyCode::Char('<')), Viewer(ViewerAction::ScrollToTop));
        log_viewer.insert(KeyBinding::new(KeyCode::Home), Viewer(ViewerAction::ScrollToTop));
        log_viewer.insert(KeyBinding::new(KeyCode::Char('G')), Viewer(ViewerAction::ScrollToBottom));
        log_viewer.insert(KeyBinding::new(KeyCode::Char('>')), Viewer(ViewerAction::ScrollToBottom));
        log_viewer.insert(KeyBinding::new(KeyCode::End), Viewer(ViewerAction::ScrollToBottom));
        // Follow / pause
        log_viewer.insert(KeyBinding::new(KeyCode::Char(' ')), Viewer(ViewerAction::ToggleFollow));
        log_viewer.insert(KeyBinding::new(KeyCode::Char('f')), Viewer(ViewerAction::ToggleFollow));
        log_viewer.insert(KeyBinding::new(KeyCode::Char('p')), Viewer(ViewerAction::TogglePause));
        // Search navigation
        log_viewer.insert(
            KeyBinding::new(KeyCode::Char('n')),
            Viewer(ViewerAction::NavigateSearch(SearchDirection::Next)),
        );
        log_viewer.insert(
            KeyBinding::new(KeyCode::Char('N')),
            Viewer(ViewerAction::NavigateSearch(SearchDirection::Prev)),
        );
        bindings.insert(KeyContext::LogViewer, log_viewer);

        // Detail pane bindings (when it has focus)
        let mut detail = HashMap::new();
        detail.insert(KeyBinding::new(KeyCode::Char('j')), Viewer(ViewerAction::ScrollDetail(1)));
        detail.insert(KeyBinding::new(KeyCode::Down), Viewer(ViewerAction::ScrollDetail(1)));
        detail.insert(KeyBinding::new(KeyCode::Char('k')), Viewer(ViewerAction::ScrollDetail(-1)));
        detail.insert(KeyBinding::new(KeyCode::Up), Viewer(ViewerAction::ScrollDetail(-1)));
        detail.insert(KeyBinding::new(KeyCode::PageDown), KeyAction::DetailPage(1));
        detail.insert(KeyBinding::ctrl(KeyCode::Char('d')), KeyAction::DetailPage(1));
        detail.insert(KeyBinding::new(KeyCode::PageUp), KeyAction::DetailPage(-1));
        detail.insert(KeyBinding::ctrl(KeyCode::Char('u')), KeyAction::DetailPage(-1));
        detail.insert(KeyBinding::new(KeyCode::Char('g')), Viewer(ViewerAction::ScrollDetail(isize::MIN)));
        detail.insert(KeyBinding::new(KeyCode::Char('G')), Viewer(ViewerAction::ScrollDetail(isize::MAX)));
        detail.insert(
            KeyBinding::new(KeyCode::Esc),
            Viewer(ViewerAction::SetSidebarMode(crate::app::SidebarMode::Hidden)),
        );
        bindings.insert(KeyContext::DetailPane, detail);

        // Command input bindings (when the command bar is active)
        let mut command_input = HashMap::new();
        command_input.insert(KeyBinding::new(KeyCode::Enter), KeyAction::Submit);
        command_input.insert(KeyBinding::new(KeyCode::Esc), KeyAction::Cancel);
        command_input.insert(KeyBinding::ctrl(KeyCode::Char('c')), KeyAction::Cancel);
        command_input.insert(KeyBinding::new(KeyCode::Backspace), KeyAction::Backspace);
        command_input.insert(KeyBinding::ctrl(KeyCode::Char('u')), KeyAction::ClearInput);
        command_input.insert(KeyBinding::new(KeyCode::Up), KeyAction::HistoryPrevious);
        command_input.insert(KeyBinding::ctrl(KeyCode::Char('p')), KeyAction::HistoryPrevious);
        command_input.insert(KeyBinding::new(KeyCode::Down), KeyAction::HistoryNext);
        command_input.insert(KeyBinding::ctrl(KeyCode::Char('n')), KeyAction::HistoryNext);
        command_input.insert(KeyBinding::new(KeyCode::Tab), KeyAction::Complete);
        bindings.insert(KeyContext::CommandInput, command_input);

        Self { bindings }
    }

    /// Look up action for key event in given context
    pub fn get_action(&self, context: KeyContext, key: &KeyEvent) -> Option<KeyAction> {
        let binding = KeyBinding::from_event(key);

        // First check context-specific bindings
        if let Some(action) = self
            .bindings
            .get(&context)
            .and_then(|context_bindings| context_bindings.get(&binding))
        {
            return Some(action.clone());
        }

        // Fall back to global bindings
        self.bindings
            .get(&KeyContext::Global)?
            .get(&binding)
            .cloned()
    }

    /// Handle key event in command input mode
    ///
    /// Returns `Input` for printable characters; global bindings do not
    /// apply while typing.
    pub fn get_command_input_action(&self, key: &KeyEvent) -> Option<KeyAction> {
        let binding = KeyBinding::from_event(key);

        if let Some(action) = self
            .bindings
            .get(&KeyContext::CommandInput)
            .and_then(|input_bindings| input_bindings.get(&binding))
        {
            return Some(action.clone());
        }

        match key.code {
            KeyCode::Char(c) if binding.modifiers.is_empty() => Some(KeyAction::Input(c)),
            _ => None,
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_context_binding_wins_over_global() {
        let bindings = KeyBindings::new();
        assert_eq!(
            bindings.get_action(KeyContext::LogViewer, &key(KeyCode::Char('j'))),
            Some(KeyAction::Viewer(ViewerAction::MoveSelection(1)))
        );
        assert_eq!(
            bindings.get_action(KeyContext::DetailPane, &key(KeyCode::Char('j'))),
            Some(KeyAction::Viewer(ViewerAction::ScrollDetail(1)))
        );
        assert_eq!(
            bindings.get_action(KeyContext::DetailPane, &key(KeyCode::Esc)),
            Some(KeyAction::Viewer(ViewerAction::SetSidebarMode(
                crate::app::SidebarMode::Hidden
            )))
        );
    }

    #[test]
    fn test_global_fallback() {
        let bindings = KeyBindings::new();
        assert_eq!(
            bindings.get_action(KeyContext::LogViewer, &key(KeyCode::Char('q'))),
            Some(KeyAction::Quit)
        );
        assert_eq!(
            bindings.get_action(KeyContext::DetailPane, &key(KeyCode::Char('/'))),
            Some(KeyAction::EnterCommandMode)
        );
        assert_eq!(bindings.get_action(KeyContext::LogViewer, &key(KeyCode::F(5))), None);
    }

    #[test]
    fn test_shifted_characters_match() {
        let bindings = KeyBindings::new();
        let shifted = KeyEvent::new(KeyCode::Char('G'), KeyModifiers::SHIFT);
        assert_eq!(
            bindings.get_action(KeyContext::LogViewer, &shifted),
            Some(KeyAction::Viewer(ViewerAction::ScrollToBottom))
        );

        let prev = KeyEvent::new(KeyCode::Char('N'), KeyModifiers::SHIFT);
        assert_eq!(
            bindings.get_action(KeyContext::LogViewer, &prev),
            Some(KeyAction::Viewer(ViewerAction::NavigateSearch(
                SearchDirection::Prev
            )))
        );
    }

    #[test]
    fn test_command_input_keys() {
        let bindings = KeyBindings::new();
        assert_eq!(
            bindings.get_command_input_action(&key(KeyCode::Char('q'))),
            Some(KeyAction::Input('q'))
        );
        assert_eq!(
            bindings.get_command_input_action(&KeyEvent::new(
                KeyCode::Char('L'),
                KeyModifiers::SHIFT
            )),
            Some(KeyAction::Input('L'))
        );
        assert_eq!(
            bindings.get_command_input_action(&key(KeyCode::Esc)),
            Some(KeyAction::Cancel)
        );
        assert_eq!(
            bindings.get_command_input_action(&key(KeyCode::Up)),
            Some(KeyAction::HistoryPrevious)
        );
        assert_eq!(
            bindings.get_command_input_action(&KeyEvent::new(
                KeyCode::Char('x'),
                KeyModifiers::ALT
            )),
            None
        );
    }
}
