use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::commands::CommandRegistry;

const PROMPT: &str = "/";

/// Text being typed in command mode, with completion candidates
pub struct CommandBarState {
    input: String,
    suggestions: Vec<String>,
    /// Suggestion last applied by Tab
    selected: Option<usize>,
}

impl Default for CommandBarState {
    fn default() -> Self {
        Self {
            input: PROMPT.to_string(),
            suggestions: Vec::new(),
            selected: None,
        }
    }
}

impl CommandBarState {
    pub fn open(&mut self, registry: &CommandRegistry) {
        self.set_input(PROMPT, registry);
    }

    pub fn close(&mut self) {
        *self = Self::default();
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Replace the whole input (history navigation)
    pub fn set_input(&mut self, text: &str, registry: &CommandRegistry) {
        self.input = text.to_string();
        self.update_suggestions(registry);
    }

    pub fn input_char(&mut self, c: char, registry: &CommandRegistry) {
        self.input.push(c);
        self.update_suggestions(registry);
    }

    pub fn input_backspace(&mut self, registry: &CommandRegistry) {
        self.input.pop();
        self.update_suggestions(registry);
    }

    pub fn clear(&mut self, registry: &CommandRegistry) {
        self.set_input(PROMPT, registry);
    }

    /// Cycle through suggestions, replacing the command name
    pub fn complete(&mut self) {
        if self.suggestions.is_empty() {
            return;
        }
        let next = self
            .selected
            .map_or(0, |i| (i + 1) % self.suggestions.len());
        self.selected = Some(next);

        let rest = self
            .input
            .split_once(' ')
            .map(|(_, rest)| rest.to_string());
        self.input = match rest {
            Some(rest) => format!("{} {rest}", self.suggestions[next]),
            None => self.suggestions[next].clone(),
        };
    }

    /// Take the typed command and reset for the next one
    pub fn submit(&mut self) -> String {
        let input = std::mem::take(&mut self.input);
        self.close();
        input
    }

    /// Suggestions follow the command name until arguments start
    fn update_suggestions(&mut self, registry: &CommandRegistry) {
        self.selected = None;
        self.suggestions = match self.input.split_once(' ') {
            None if self.input.starts_with('/') && self.input.len() > 1 => {
                registry.suggestions(&self.input)
            }
            _ => Vec::new(),
        };
    }
}

/// Single-line command prompt
pub struct CommandBar;

impl CommandBar {
    pub fn render(frame: &mut Frame, area: Rect, state: &CommandBarState) {
        let mut spans = vec![
            Span::styled(
                "Command: ",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled(state.input().to_string(), Style::default().fg(Color::White)),
            Span::styled("▋", Style::default().fg(Color::Cyan)),
        ];

        if !state.suggestions().is_empty() {
            spans.push(Span::raw("   "));
            for (i, suggestion) in state.suggestions().iter().enumerate() {
                let style = if Some(i) == state.selected() {
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                spans.push(Span::styled(suggestion.clone(), style));
                spans.push(Span::raw("  "));
            }
        }

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_with_prompt() {
        let state = CommandBarState::default();
        assert_eq!(state.input(), "/");
        assert!(state.suggestions().is_empty());
    }

    #[test]
    fn test_typing_updates_suggestions() {
        let registry = CommandRegistry::new();
        let mut state = CommandBarState::default();
        for c in "cle".chars() {
            state.input_char(c, &registry);
        }
        assert_eq!(
            state.suggestions(),
            ["/clear-filter", "/clear-search", "/clear"]
        );

        // Arguments hide suggestions
        state.set_input("/filter db", &registry);
        assert!(state.suggestions().is_empty());
    }

    #[test]
    fn test_tab_cycles_and_keeps_arguments() {
        let registry = CommandRegistry::new();
        let mut state = CommandBarState::default();
        state.set_input("/se", &registry);

        state.complete();
        assert_eq!(state.input(), "/search");
        state.complete();
        assert_eq!(state.input(), "/search-next");

        let mut state = CommandBarState::default();
        state.set_input("/f", &registry);
        state.input = "/f timeout".to_string();
        state.complete();
        assert_eq!(state.input(), "/filter timeout");
    }

    #[test]
    fn test_submit_resets() {
        let registry = CommandRegistry::new();
        let mut state = CommandBarState::default();
        state.set_input("/quit", &registry);
        assert_eq!(state.submit(), "/quit");
        assert_eq!(state.input(), "/");
    }
}
