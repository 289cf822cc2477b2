mod config;

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, error::ErrorKind};
use crossterm::event::{KeyCode, KeyEvent};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use logscope_logs::{IngestPipeline, IngestSource, LogParser, StoreBacking};
use logscope_tui::{
    CommandBarState, Event, EventHandler, FocusedPane, FrameLayout, KeyAction, KeyBindings,
    KeyContext, LogViewerScreen, Session, Theme, Tui, ViewerAction, install_panic_hook,
};
use logscope_types::Config;

/// UI tick: debounce polling and redraw cadence
const TICK_RATE: Duration = Duration::from_millis(33);

/// logscope - an interactive viewer for piped or streamed logs
#[derive(Parser, Debug)]
#[command(name = "logscope")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Shell command whose output to view
    #[arg(short = 'c', long = "command", value_name = "CMD", conflicts_with = "exec")]
    command: Option<String>,

    /// Maximum number of records kept in memory
    #[arg(long, value_name = "N", conflicts_with = "unbounded")]
    buffer_size: Option<usize>,

    /// Keep every record (no eviction)
    #[arg(long)]
    unbounded: bool,

    /// Start with follow mode off
    #[arg(long)]
    no_follow: bool,

    /// Configuration file (skips the default search)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write diagnostics to this file (RUST_LOG controls the level)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Command to run, after `--`
    #[arg(last = true, value_name = "COMMAND")]
    exec: Vec<String>,
}

impl Args {
    fn store_backing(&self, config: &Config) -> StoreBacking {
        if self.unbounded {
            StoreBacking::Unbounded
        } else {
            StoreBacking::Bounded(self.buffer_size.unwrap_or(config.defaults.buffer_size))
        }
    }

    fn follow_mode(&self, config: &Config) -> bool {
        config.defaults.follow_mode && !self.no_follow
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(args.log_file.as_deref())?;

    let Some(source) = resolve_source(&args, std::io::stdin().is_terminal()) else {
        Args::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                "no input: pipe logs into logscope or give a command (-c <CMD> or -- <COMMAND>...)",
            )
            .exit();
    };

    let loaded = config::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Run the application
    let result = run_app(args, source, loaded.config).await;

    // Handle any errors
    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    result
}

/// Logs go to a file or nowhere; the terminal belongs to the UI
fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_file {
        Some(path) => {
            let directory = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .with_context(|| format!("Invalid log file path: {}", path.display()))?;
            let file_appender = tracing_appender::rolling::never(directory, file_name);

            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(file_appender)
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::sink)
                .init();
        }
    }

    Ok(())
}

/// `-c` wins over `-- COMMAND`, which wins over piped stdin
fn resolve_source(args: &Args, stdin_is_terminal: bool) -> Option<IngestSource> {
    if let Some(command) = &args.command {
        return Some(IngestSource::Command(command.clone()));
    }
    if !args.exec.is_empty() {
        return Some(IngestSource::Command(shell_join(&args.exec)));
    }
    if !stdin_is_terminal {
        return Some(IngestSource::Stdin);
    }
    None
}

/// Quote arguments so `sh -c` sees the same argv
fn shell_join(words: &[String]) -> String {
    words
        .iter()
        .map(|word| {
            let plain = !word.is_empty()
                && word
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || "-_./=:,@%+".contains(c));
            if plain {
                word.clone()
            } else {
                format!("'{}'", word.replace('\'', r"'\''"))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

async fn run_app(args: Args, source: IngestSource, config: Config) -> Result<()> {
    let store = args
        .store_backing(&config)
        .open()
        .context("Failed to create log store")?;

    // Start ingesting before taking over the terminal so spawn errors print normally
    let (ingest_tx, mut ingest_rx) = mpsc::unbounded_channel();
    let mut pipeline = IngestPipeline::new(store.clone(), LogParser::new(&config), ingest_tx);
    pipeline.start(source).context("Failed to start input")?;

    let mut session = Session::new(store, args.follow_mode(&config));
    session.dispatch(ViewerAction::SetStreaming(true));

    let theme = Theme::from_config(&config.colors);
    let keybindings = KeyBindings::new();
    let mut command_bar = CommandBarState::default();

    // Initialize TUI
    install_panic_hook();
    let mut tui = Tui::new().context("Failed to initialize terminal")?;

    // Initialize event handler
    let mut events = EventHandler::new(TICK_RATE);

    loop {
        render(&mut tui, &mut session, &theme, &command_bar)?;

        tokio::select! {
            event = events.next() => match event {
                Some(Event::Key(key)) => {
                    handle_key(&mut session, &keybindings, &mut command_bar, key);
                }
                Some(Event::Tick) => {
                    session.poll_detail(Instant::now());
                }
                Some(Event::Resize(_, _)) => {}
                Some(Event::Error(e)) => {
                    tracing::warn!(error = %e, "Terminal input error");
                }
                None => break,
            },

            Some(event) = ingest_rx.recv() => {
                session.on_ingest_event(event);
            }
        }

        if session.should_quit() {
            break;
        }
    }

    // Cleanup
    pipeline.stop();
    let stats = pipeline.stats();
    tracing::info!(
        lines = pipeline.line_counter().current(),
        received = stats.received(),
        dropped = stats.dropped(),
        "Input stopped"
    );
    events.shutdown();
    tui.restore()?;

    Ok(())
}

/// Draw, then feed measured sizes back; a second pass applies them
fn render(
    tui: &mut Tui,
    session: &mut Session,
    theme: &Theme,
    command_bar: &CommandBarState,
) -> Result<()> {
    for _ in 0..2 {
        let mut layout = FrameLayout::default();
        tui.terminal().draw(|frame| {
            layout = LogViewerScreen::render(frame, session, theme, command_bar);
        })?;

        if !apply_layout(session, layout) {
            break;
        }
    }
    Ok(())
}

/// Returns true when the state changed and the frame is stale
fn apply_layout(session: &mut Session, layout: FrameLayout) -> bool {
    let state = session.state();
    let mut actions = Vec::new();

    if let Some(rows) = layout.log_rows {
        if rows.max(1) != state.viewport_height {
            actions.push(ViewerAction::SetViewportHeight(rows));
        }
    }
    if let Some(detail) = layout.detail {
        if detail.content_lines != state.detail_content_lines
            || detail.visible_height != state.detail_visible_height
        {
            actions.push(ViewerAction::DetailLayoutChanged {
                content_lines: detail.content_lines,
                visible_height: detail.visible_height,
            });
        }
    }

    let changed = !actions.is_empty();
    for action in actions {
        session.dispatch(action);
    }
    changed
}

fn handle_key(
    session: &mut Session,
    keybindings: &KeyBindings,
    command_bar: &mut CommandBarState,
    key: KeyEvent,
) {
    let state = session.state();

    if state.command_mode {
        handle_command_key(session, keybindings, command_bar, &key);
        return;
    }

    // Help overlay swallows keys until closed
    if state.show_help {
        if matches!(key.code, KeyCode::Char('?') | KeyCode::Char('q') | KeyCode::Esc) {
            session.dispatch(ViewerAction::SetHelp(false));
        }
        return;
    }

    let context = match state.focused_pane {
        FocusedPane::Logs => KeyContext::LogViewer,
        FocusedPane::Details => KeyContext::DetailPane,
    };
    let detail_page = state.detail_visible_height.max(1) as isize;

    let Some(action) = keybindings.get_action(context, &key) else {
        return;
    };

    match action {
        KeyAction::Viewer(action) => session.dispatch(action),
        KeyAction::DetailPage(direction) => {
            session.dispatch(ViewerAction::ScrollDetail(direction * detail_page));
        }
        KeyAction::EnterCommandMode => {
            command_bar.open(&session.registry());
            session.dispatch(ViewerAction::SetStatus(None));
            session.dispatch(ViewerAction::SetCommandMode(true));
        }
        KeyAction::Quit => session.request_quit(),
        _ => {}
    }
}

fn handle_command_key(
    session: &mut Session,
    keybindings: &KeyBindings,
    command_bar: &mut CommandBarState,
    key: &KeyEvent,
) {
    let Some(action) = keybindings.get_command_input_action(key) else {
        return;
    };
    let registry = session.registry();

    match action {
        KeyAction::Submit => {
            let input = command_bar.submit();
            session.history_mut().reset();
            if input.trim().trim_start_matches('/').is_empty() {
                session.dispatch(ViewerAction::SetCommandMode(false));
            } else {
                session.execute_command(&input);
            }
        }
        KeyAction::Cancel => {
            command_bar.close();
            session.history_mut().reset();
            session.dispatch(ViewerAction::SetCommandMode(false));
        }
        KeyAction::Backspace => {
            command_bar.input_backspace(&registry);
            if command_bar.input().is_empty() {
                command_bar.close();
                session.dispatch(ViewerAction::SetCommandMode(false));
            }
        }
        KeyAction::ClearInput => command_bar.clear(&registry),
        KeyAction::HistoryPrevious => {
            let current = command_bar.input().to_string();
            if let Some(entry) = session.history_mut().previous(&current).map(str::to_string) {
                command_bar.set_input(&entry, &registry);
            }
        }
        KeyAction::HistoryNext => {
            if let Some(entry) = session.history_mut().next().map(str::to_string) {
                command_bar.set_input(&entry, &registry);
            }
        }
        KeyAction::Complete => command_bar.complete(),
        KeyAction::Input(c) => command_bar.input_char(c, &registry),
        _ => {}
    }
}
