/// A `/name arg...` line split into its parts
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Lowercased command name without the slash
    pub name: String,
    pub args: Vec<String>,
    /// The input as typed
    pub raw: String,
}

/// Parse command text; `None` unless it starts with `/` followed by a name
pub fn parse_command(input: &str) -> Option<ParsedCommand> {
    let rest = input.trim().strip_prefix('/')?;
    let mut parts = rest.split_whitespace();
    let name = parts.next()?.to_lowercase();

    Some(ParsedCommand {
        name,
        args: parts.map(str::to_string).collect(),
        raw: input.to_string(),
    })
}
