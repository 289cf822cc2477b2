use logscope_types::{Filter, LogLevel, SortOrder};

use super::{CommandContext, CommandError};
use crate::app::{SearchDirection, ViewerAction};

type HandlerResult = Result<Option<String>, CommandError>;

// ============================================================================
// Filtering
// ============================================================================

pub(super) fn filter(args: &[String], ctx: &mut dyn CommandContext) -> HandlerResult {
    if args.is_empty() {
        return Err(CommandError::Usage("/filter <keyword> or /filter level:<level>"));
    }

    let arg = args.join(" ");
    let level_prefix = arg.get(..6).filter(|p| p.eq_ignore_ascii_case("level:"));
    if level_prefix.is_some() {
        let name = arg[6..].trim().to_lowercase();
        let level = LogLevel::FILTERABLE
            .into_iter()
            .find(|level| level.name() == name)
            .ok_or_else(|| {
                let valid: Vec<&str> = LogLevel::FILTERABLE.iter().map(|l| l.name()).collect();
                CommandError::InvalidArgument(format!(
                    "Invalid level. Valid levels: {}",
                    valid.join(", ")
                ))
            })?;

        ctx.dispatch(ViewerAction::AddFilter(Filter::level(level)));
        return Ok(Some(format!("Filter added: level:{level}")));
    }

    ctx.dispatch(ViewerAction::AddFilter(Filter::keyword(arg.clone())));
    Ok(Some(format!("Filter added: \"{arg}\"")))
}

pub(super) fn clear_filter(_args: &[String], ctx: &mut dyn CommandContext) -> HandlerResult {
    ctx.dispatch(ViewerAction::ClearFilters);
    Ok(Some("All filters cleared".into()))
}

pub(super) fn sort(args: &[String], ctx: &mut dyn CommandContext) -> HandlerResult {
    let Some(arg) = args.first() else {
        return Err(CommandError::Usage("/sort <timestamp|level|default>"));
    };

    let order = SortOrder::from_arg(arg).ok_or_else(|| {
        CommandError::InvalidArgument(format!(
            "Invalid sort type: {}. Use: timestamp, level, or default",
            arg.to_lowercase()
        ))
    })?;

    ctx.dispatch(ViewerAction::SetSort(order));
    Ok(Some(match order {
        SortOrder::Default => "Sorting by default (chronological) order".into(),
        other => format!("Sorting by {}", other.label()),
    }))
}

// ============================================================================
// Search
// ============================================================================

pub(super) fn search(args: &[String], ctx: &mut dyn CommandContext) -> HandlerResult {
    if args.is_empty() {
        return Err(CommandError::Usage("/search <term>"));
    }

    let term = args.join(" ");
    ctx.dispatch(ViewerAction::SetSearch(Some(term.clone())));
    Ok(Some(format!(
        "Searching for \"{term}\" - use n/N to navigate matches"
    )))
}

pub(super) fn search_next(_args: &[String], ctx: &mut dyn CommandContext) -> HandlerResult {
    navigate(ctx, SearchDirection::Next)
}

pub(super) fn search_prev(_args: &[String], ctx: &mut dyn CommandContext) -> HandlerResult {
    navigate(ctx, SearchDirection::Prev)
}

fn navigate(ctx: &mut dyn CommandContext, direction: SearchDirection) -> HandlerResult {
    let state = ctx.state();
    if state.search_term.is_none() {
        return Err(CommandError::Unavailable(
            "No active search. Use /search <term> first.",
        ));
    }
    if state.search_matches.is_empty() {
        return Err(CommandError::Unavailable("No matches found"));
    }

    ctx.dispatch(ViewerAction::NavigateSearch(direction));
    let state = ctx.state();
    Ok(state.current_match_index.map(|index| {
        format!("Match {} of {}", index + 1, state.search_matches.len())
    }))
}

pub(super) fn clear_search(_args: &[String], ctx: &mut dyn CommandContext) -> HandlerResult {
    ctx.dispatch(ViewerAction::ClearSearch);
    Ok(Some("Search cleared".into()))
}

// ============================================================================
// Display
// ============================================================================

pub(super) fn follow(_args: &[String], ctx: &mut dyn CommandContext) -> HandlerResult {
    ctx.dispatch(ViewerAction::SetFollow(true));
    Ok(Some("Follow mode enabled".into()))
}

pub(super) fn nofollow(_args: &[String], ctx: &mut dyn CommandContext) -> HandlerResult {
    ctx.dispatch(ViewerAction::SetFollow(false));
    Ok(Some("Follow mode disabled".into()))
}

pub(super) fn clear(_args: &[String], ctx: &mut dyn CommandContext) -> HandlerResult {
    ctx.clear_records();
    Ok(Some("Logs cleared".into()))
}

pub(super) fn help(_args: &[String], ctx: &mut dyn CommandContext) -> HandlerResult {
    ctx.dispatch(ViewerAction::SetHelp(true));
    Ok(None)
}

pub(super) fn quit(_args: &[String], ctx: &mut dyn CommandContext) -> HandlerResult {
    ctx.quit();
    Ok(None)
}
