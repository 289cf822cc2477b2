use std::collections::VecDeque;

/// Maximum number of remembered commands
pub const MAX_HISTORY: usize = 100;

/// In-memory command line history with shell-style navigation
#[derive(Debug, Default)]
pub struct CommandHistory {
    entries: VecDeque<String>,
    /// Position while navigating (`None` = editing a fresh line)
    cursor: Option<usize>,
    /// Input that was being typed when navigation started
    stash: String,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember a command; blank input and consecutive repeats are skipped
    pub fn add(&mut self, command: &str) {
        self.reset();
        let command = command.trim();
        if command.is_empty() || self.entries.back().is_some_and(|last| last == command) {
            return;
        }

        self.entries.push_back(command.to_string());
        while self.entries.len() > MAX_HISTORY {
            self.entries.pop_front();
        }
    }

    /// Step to an older entry, stashing `current_input` on the first step
    pub fn previous(&mut self, current_input: &str) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }

        let index = match self.cursor {
            None => {
                self.stash = current_input.to_string();
                self.entries.len() - 1
            }
            Some(0) => 0,
            Some(i) => i - 1,
        };
        self.cursor = Some(index);
        self.entries.get(index).map(String::as_str)
    }

    /// Step to a newer entry; walking past the newest returns the stash
    pub fn next(&mut self) -> Option<&str> {
        let index = self.cursor?;
        if index + 1 < self.entries.len() {
            self.cursor = Some(index + 1);
            return self.entries.get(index + 1).map(String::as_str);
        }

        self.cursor = None;
        Some(self.stash.as_str())
    }

    /// Leave navigation mode
    pub fn reset(&mut self) {
        self.cursor = None;
        self.stash.clear();
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_skips_blank_and_repeats() {
        let mut history = CommandHistory::new();
        history.add("/filter db");
        history.add("  /filter db  ");
        history.add("   ");
        history.add("/search x");
        history.add("/filter db");
        assert_eq!(
            history.entries().collect::<Vec<_>>(),
            vec!["/filter db", "/search x", "/filter db"]
        );
    }

    #[test]
    fn test_bounded() {
        let mut history = CommandHistory::new();
        for i in 0..150 {
            history.add(&format!("/search {i}"));
        }
        assert_eq!(history.len(), MAX_HISTORY);
        assert_eq!(history.entries().next(), Some("/search 50"));
    }

    #[test]
    fn test_navigation_restores_stash() {
        let mut history = CommandHistory::new();
        history.add("/one");
        history.add("/two");

        assert_eq!(history.previous("/dra"), Some("/two"));
        assert_eq!(history.previous("/two"), Some("/one"));
        assert_eq!(history.previous("/one"), Some("/one"));
        assert_eq!(history.next(), Some("/two"));
        assert_eq!(history.next(), Some("/dra"));
        assert_eq!(history.next(), None);
    }

    #[test]
    fn test_empty_history() {
        let mut history = CommandHistory::new();
        assert_eq!(history.previous("x"), None);
        assert_eq!(history.next(), None);
    }
}
