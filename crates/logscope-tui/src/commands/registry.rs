use super::handlers;
use super::{CommandContext, CommandHandler, parse_command};

/// Maximum suggestions offered for a non-empty prefix
const MAX_SUGGESTIONS: usize = 5;

/// A built-in command
pub struct CommandDefinition {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub description: &'static str,
    pub usage: &'static str,
    pub examples: &'static [&'static str],
    pub handler: CommandHandler,
}

impl CommandDefinition {
    fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.contains(&name)
    }
}

/// Outcome of running a command line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandResult {
    pub success: bool,
    pub message: Option<String>,
}

impl CommandResult {
    fn ok(message: Option<String>) -> Self {
        Self {
            success: true,
            message,
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

static COMMANDS: &[CommandDefinition] = &[
    CommandDefinition {
        name: "filter",
        aliases: &[],
        description: "Filter logs by keyword or level",
        usage: "/filter <keyword> or /filter level:<level>",
        examples: &["/filter timeout", "/filter level:error"],
        handler: handlers::filter,
    },
    CommandDefinition {
        name: "clear-filter",
        aliases: &["unfilter", "cf"],
        description: "Clear all active filters",
        usage: "/clear-filter",
        examples: &["/clear-filter"],
        handler: handlers::clear_filter,
    },
    CommandDefinition {
        name: "search",
        aliases: &["s", "find"],
        description: "Highlight matching text in logs (shows all logs)",
        usage: "/search <term>",
        examples: &["/search error", "/search user login"],
        handler: handlers::search,
    },
    CommandDefinition {
        name: "search-next",
        aliases: &["n", "next"],
        description: "Jump to next search result",
        usage: "/search-next",
        examples: &["/search-next", "/n"],
        handler: handlers::search_next,
    },
    CommandDefinition {
        name: "search-prev",
        aliases: &["p", "prev"],
        description: "Jump to previous search result",
        usage: "/search-prev",
        examples: &["/search-prev", "/p"],
        handler: handlers::search_prev,
    },
    CommandDefinition {
        name: "clear-search",
        aliases: &["cs"],
        description: "Clear current search",
        usage: "/clear-search",
        examples: &["/clear-search"],
        handler: handlers::clear_search,
    },
    CommandDefinition {
        name: "follow",
        aliases: &["tail"],
        description: "Enable auto-scroll to newest logs",
        usage: "/follow",
        examples: &["/follow"],
        handler: handlers::follow,
    },
    CommandDefinition {
        name: "nofollow",
        aliases: &["pause", "stop"],
        description: "Disable auto-scroll for manual navigation",
        usage: "/nofollow",
        examples: &["/nofollow", "/pause"],
        handler: handlers::nofollow,
    },
    CommandDefinition {
        name: "clear",
        aliases: &["cls"],
        description: "Clear current log buffer",
        usage: "/clear",
        examples: &["/clear"],
        handler: handlers::clear,
    },
    CommandDefinition {
        name: "help",
        aliases: &["h", "?"],
        description: "Show available commands",
        usage: "/help",
        examples: &["/help"],
        handler: handlers::help,
    },
    CommandDefinition {
        name: "quit",
        aliases: &["q", "exit"],
        description: "Exit the application",
        usage: "/quit",
        examples: &["/quit"],
        handler: handlers::quit,
    },
    CommandDefinition {
        name: "sort",
        aliases: &[],
        description: "Sort logs by timestamp, level, or default order",
        usage: "/sort <timestamp|level|default>",
        examples: &["/sort timestamp", "/sort level", "/sort default"],
        handler: handlers::sort,
    },
];

/// Static table of built-in commands
#[derive(Clone, Copy)]
pub struct CommandRegistry {
    commands: &'static [CommandDefinition],
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self { commands: COMMANDS }
    }

    /// All commands in registry order
    pub fn commands(&self) -> &'static [CommandDefinition] {
        self.commands
    }

    /// Resolve a name or alias (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&'static CommandDefinition> {
        let name = name.to_lowercase();
        self.commands.iter().find(|cmd| cmd.answers_to(&name))
    }

    /// Parse and run a command line; never fails outward
    pub fn execute(&self, input: &str, ctx: &mut dyn CommandContext) -> CommandResult {
        let Some(parsed) = parse_command(input) else {
            return CommandResult::failed("Invalid command format. Commands must start with /");
        };

        let Some(command) = self.get(&parsed.name) else {
            return CommandResult::failed(format!(
                "Unknown command: {}. Type /help for available commands.",
                parsed.name
            ));
        };

        tracing::debug!(command = command.name, args = ?parsed.args, "Executing command");
        match (command.handler)(&parsed.args, ctx) {
            Ok(message) => CommandResult::ok(message),
            Err(e) => CommandResult::failed(e.to_string()),
        }
    }

    /// Command completions for what has been typed so far
    pub fn suggestions(&self, prefix: &str) -> Vec<String> {
        let input = prefix.trim().to_lowercase();
        let input = input.strip_prefix('/').unwrap_or(&input);

        if input.is_empty() {
            return self.commands.iter().map(|cmd| format!("/{}", cmd.name)).collect();
        }

        let mut matches: Vec<String> = Vec::new();
        for cmd in self.commands {
            let names = std::iter::once(cmd.name).chain(cmd.aliases.iter().copied());
            for name in names.filter(|name| name.starts_with(input)) {
                let suggestion = format!("/{name}");
                if !matches.contains(&suggestion) {
                    matches.push(suggestion);
                }
            }
        }
        matches.truncate(MAX_SUGGESTIONS);
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{ViewerAction, ViewerState};
    use logscope_types::{Filter, LogLevel, SortOrder};

    #[derive(Default)]
    struct TestContext {
        state: ViewerState,
        cleared: bool,
        quit: bool,
    }

    impl CommandContext for TestContext {
        fn dispatch(&mut self, action: ViewerAction) {
            self.state = std::mem::take(&mut self.state).reduce(&action);
        }

        fn state(&self) -> &ViewerState {
            &self.state
        }

        fn clear_records(&mut self) {
            self.cleared = true;
            self.dispatch(ViewerAction::ClearRecords);
        }

        fn quit(&mut self) {
            self.quit = true;
        }
    }

    fn run(ctx: &mut TestContext, input: &str) -> CommandResult {
        CommandRegistry::new().execute(input, ctx)
    }

    #[test]
    fn test_filter_level_and_keyword() {
        let mut ctx = TestContext::default();
        let result = run(&mut ctx, "/filter level:ERROR");
        assert!(result.success);
        assert_eq!(result.message.as_deref(), Some("Filter added: level:error"));

        let result = run(&mut ctx, "/filter user 42");
        assert_eq!(result.message.as_deref(), Some("Filter added: \"user 42\""));
        assert_eq!(
            ctx.state.active_filters,
            vec![Filter::level(LogLevel::Error), Filter::keyword("user 42")]
        );

        let result = run(&mut ctx, "/cf");
        assert!(result.success);
        assert!(ctx.state.active_filters.is_empty());
    }

    #[test]
    fn test_invalid_arguments_fail() {
        let mut ctx = TestContext::default();

        let result = run(&mut ctx, "/filter level:loud");
        assert!(!result.success);
        assert_eq!(
            result.message.as_deref(),
            Some("Invalid level. Valid levels: error, warn, info, debug, trace")
        );

        let result = run(&mut ctx, "/filter");
        assert!(!result.success);
        assert!(result.message.unwrap_or_default().starts_with("Usage:"));

        let result = run(&mut ctx, "/sort random");
        assert!(!result.success);
        assert!(ctx.state.active_filters.is_empty());
    }

    #[test]
    fn test_unknown_and_malformed() {
        let mut ctx = TestContext::default();
        let result = run(&mut ctx, "/frobnicate");
        assert!(!result.success);
        assert_eq!(
            result.message.as_deref(),
            Some("Unknown command: frobnicate. Type /help for available commands.")
        );

        let result = run(&mut ctx, "filter x");
        assert!(!result.success);
    }

    #[test]
    fn test_search_does_not_filter() {
        let mut ctx = TestContext::default();
        let result = run(&mut ctx, "/find disk full");
        assert!(result.success);
        assert_eq!(ctx.state.search_term.as_deref(), Some("disk full"));
        assert!(ctx.state.active_filters.is_empty());
    }

    #[test]
    fn test_search_navigation_reports_state() {
        let mut ctx = TestContext::default();
        let result = run(&mut ctx, "/n");
        assert!(!result.success);
        assert_eq!(
            result.message.as_deref(),
            Some("No active search. Use /search <term> first.")
        );

        run(&mut ctx, "/search x");
        let result = run(&mut ctx, "/search-prev");
        assert_eq!(result.message.as_deref(), Some("No matches found"));
        assert_eq!(ctx.state.current_match_index, None);

        ctx.dispatch(ViewerAction::CountsUpdated {
            total: 10,
            filtered: 10,
        });
        ctx.dispatch(ViewerAction::SearchMatchesUpdated(vec![2, 7]));
        let result = run(&mut ctx, "/next");
        assert!(result.success);
        assert_eq!(result.message.as_deref(), Some("Match 1 of 2"));
        assert_eq!(ctx.state.selected_index, Some(2));

        run(&mut ctx, "/cs");
        assert_eq!(ctx.state.search_term, None);
    }

    #[test]
    fn test_sort_synonyms() {
        let mut ctx = TestContext::default();
        run(&mut ctx, "/sort TS");
        assert_eq!(ctx.state.sort_by, SortOrder::Timestamp);
        run(&mut ctx, "/sort severity");
        assert_eq!(ctx.state.sort_by, SortOrder::Level);
        let result = run(&mut ctx, "/sort none");
        assert_eq!(
            result.message.as_deref(),
            Some("Sorting by default (chronological) order")
        );
        assert_eq!(ctx.state.sort_by, SortOrder::Default);
    }

    #[test]
    fn test_display_commands() {
        let mut ctx = TestContext::default();
        run(&mut ctx, "/pause");
        assert!(!ctx.state.follow_mode);
        run(&mut ctx, "/tail");
        assert!(ctx.state.follow_mode);

        run(&mut ctx, "/?");
        assert!(ctx.state.show_help);

        run(&mut ctx, "/cls");
        assert!(ctx.cleared);

        run(&mut ctx, "/EXIT");
        assert!(ctx.quit);
    }

    #[test]
    fn test_suggestions() {
        let registry = CommandRegistry::new();
        assert_eq!(registry.suggestions("").len(), COMMANDS.len());
        assert_eq!(
            registry.suggestions("/clear"),
            vec!["/clear-filter", "/clear-search", "/clear"]
        );
        assert_eq!(
            registry.suggestions("S"),
            vec!["/search", "/s", "/search-next", "/search-prev", "/stop"]
        );
        // Registry order puts sort last
        assert_eq!(registry.suggestions("so"), vec!["/sort"]);
        assert_eq!(registry.suggestions("").last().map(String::as_str), Some("/sort"));
        assert!(registry.suggestions("zzz").is_empty());
    }

    #[test]
    fn test_lookup_by_alias() {
        let registry = CommandRegistry::new();
        assert_eq!(registry.get("UNFILTER").map(|c| c.name), Some("clear-filter"));
        assert!(registry.get("nope").is_none());
    }
}
