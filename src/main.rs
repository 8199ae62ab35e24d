mod app;
mod config;
mod core;
mod domain;
mod infrastructure;
mod ui;

use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use alloy::primitives::Address;
use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::app::{App, InputMode, StatusLevel};
use crate::core::{Action, Msg};
use crate::infrastructure::artifact::ArtifactSource;
use crate::infrastructure::ethereum::{normalize_http_endpoint, ProviderConfig};
use crate::infrastructure::runtime::{RuntimeBridge, RuntimeCommand, WorkerSettings};
use crate::ui::layout::UiAreas;

#[derive(Debug, Default, Parser)]
#[command(
    name = "faucet",
    version,
    about = "Faucet: donate to and withdraw from a faucet contract through a wallet provider"
)]
struct Args {
    /// HTTP JSON-RPC endpoint (e.g. http://localhost:8545)
    #[arg(long)]
    rpc: Option<String>,

    /// WebSocket endpoint (e.g. ws://localhost:8546)
    #[arg(long)]
    ws: Option<String>,

    /// IPC path (e.g. ~/.ethereum/geth.ipc). Unix only.
    #[arg(long)]
    ipc: Option<PathBuf>,

    /// Contract artifact name (default: Faucet)
    #[arg(long)]
    contract: Option<String>,

    /// Directory to search for build artifacts (repeatable)
    #[arg(long = "artifacts")]
    artifacts: Vec<String>,

    /// Deployed contract address; skips the artifact's networks map
    #[arg(long)]
    address: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();
    let config = config::load();

    let endpoints = endpoints_from_args_and_config(&args, &config)?;
    let endpoints_label = endpoints
        .iter()
        .map(ProviderConfig::display)
        .collect::<Vec<_>>()
        .join(", ");
    let artifact = artifact_source(&args, &config)?;
    info!(endpoints = %endpoints_label, contract = %artifact.name, "starting");

    let settings = WorkerSettings {
        endpoints,
        artifact: artifact.clone(),
        watch_interval: config.watch_interval(),
    };
    let runtime = RuntimeBridge::new(settings)?;
    let app = App::new(artifact.name, endpoints_label);

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app, runtime);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!("{err:#}");
        eprintln!("{err:?}");
    }

    Ok(())
}

/// Log to a file; stdout belongs to the terminal UI
fn init_logging() {
    let Some(path) = config::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    runtime: RuntimeBridge,
) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    app.dispatch(Msg::Mounted);

    loop {
        pump_background(&mut app, &runtime);
        terminal.draw(|f| ui::draw(f, &app))?;
        if app.should_quit {
            let _ = runtime.send(RuntimeCommand::Shutdown);
            return Ok(());
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => handle_key(&mut app, key),
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse),
                _ => {}
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = Instant::now();
        }

        pump_background(&mut app, &runtime);
    }
}

/// Move runtime events into the app and queued actions out to the runtime
fn pump_background(app: &mut App, runtime: &RuntimeBridge) {
    for event in runtime.poll_events() {
        app.apply_runtime_event(event);
    }

    for action in app.take_outbox().into_iter().filter(Action::is_runtime) {
        let Some(cmd) = RuntimeCommand::from_action(&action) else {
            continue;
        };
        if let Err(err) = runtime.send(cmd) {
            error!("{err:#}");
            app.set_status(err.to_string(), StatusLevel::Error);
        }
    }

    if let Some(text) = app.take_copy_request() {
        copy_to_clipboard(app, text);
    }
}

fn endpoints_from_args_and_config(
    args: &Args,
    config: &config::Config,
) -> Result<Vec<ProviderConfig>> {
    use std::collections::BTreeSet;

    fn push_endpoint(
        endpoints: &mut Vec<ProviderConfig>,
        seen: &mut BTreeSet<String>,
        endpoint: ProviderConfig,
    ) {
        if seen.insert(endpoint.display().to_lowercase()) {
            endpoints.push(endpoint);
        }
    }

    fn non_empty(value: Option<&str>) -> Option<&str> {
        value.map(str::trim).filter(|s| !s.is_empty())
    }

    let mut endpoints = Vec::new();
    let mut seen = BTreeSet::<String>::new();

    // CLI arguments are tried first
    if let Some(ipc) = args.ipc.clone() {
        #[cfg(unix)]
        {
            push_endpoint(&mut endpoints, &mut seen, ProviderConfig::Ipc(ipc));
        }
        #[cfg(not(unix))]
        {
            let _ = ipc;
            return Err(anyhow::anyhow!("IPC is not supported on this platform"));
        }
    }
    if let Some(ws) = non_empty(args.ws.as_deref()) {
        push_endpoint(
            &mut endpoints,
            &mut seen,
            ProviderConfig::WebSocket(ws.to_string()),
        );
    }
    if let Some(rpc) = non_empty(args.rpc.as_deref()) {
        push_endpoint(
            &mut endpoints,
            &mut seen,
            ProviderConfig::Http(normalize_http_endpoint(rpc)),
        );
    }

    // Config file endpoints, in file order
    for entry in &config.endpoints {
        tracing::debug!(name = ?entry.name, "config endpoint");
        if let Some(rpc) = non_empty(entry.rpc.as_deref()) {
            push_endpoint(
                &mut endpoints,
                &mut seen,
                ProviderConfig::Http(normalize_http_endpoint(rpc)),
            );
        }
        if let Some(ws) = non_empty(entry.ws.as_deref()) {
            push_endpoint(
                &mut endpoints,
                &mut seen,
                ProviderConfig::WebSocket(ws.to_string()),
            );
        }
        #[cfg(unix)]
        {
            if let Some(ipc) = non_empty(entry.ipc.as_deref()).and_then(expand_path) {
                push_endpoint(&mut endpoints, &mut seen, ProviderConfig::Ipc(ipc));
            }
        }
    }

    // Default fallback
    if endpoints.is_empty() {
        push_endpoint(
            &mut endpoints,
            &mut seen,
            ProviderConfig::Http(normalize_http_endpoint("localhost:8545")),
        );
    }

    Ok(endpoints)
}

fn artifact_source(args: &Args, config: &config::Config) -> Result<ArtifactSource> {
    let name = args
        .contract
        .clone()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| config.contract_name());

    let raw_roots = if args.artifacts.is_empty() {
        config.artifact_roots()
    } else {
        args.artifacts.clone()
    };
    let roots = raw_roots.iter().filter_map(|raw| expand_path(raw)).collect();

    let address_override = match args.address.as_deref().or(config.contract_address.as_deref()) {
        Some(raw) => Some(
            raw.trim()
                .parse::<Address>()
                .with_context(|| format!("Invalid contract address: {raw}"))?,
        ),
        None => None,
    };

    Ok(ArtifactSource {
        name,
        roots,
        address_override,
    })
}

fn expand_path(path: &str) -> Option<PathBuf> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(rest) = trimmed.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
            return Some(home.join(rest));
        }
    }

    let mut buf = PathBuf::from(trimmed);
    if buf.is_relative() {
        if let Ok(cwd) = std::env::current_dir() {
            buf = cwd.join(buf);
        }
    }
    Some(buf)
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    if app.help_open {
        if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q')) {
            app.help_open = false;
        }
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Command => handle_command_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('?') => app.help_open = true,
        KeyCode::Char(':') => app.enter_command(),
        KeyCode::Char('c') => app.dispatch(Msg::ConnectRequested),
        KeyCode::Char('d') => app.dispatch(Msg::DepositRequested),
        KeyCode::Char('w') => app.dispatch(Msg::WithdrawRequested),
        KeyCode::Char('r') => app.dispatch(Msg::ReloadRequested),
        KeyCode::Char('y') => app.request_copy(),
        KeyCode::Esc => app.status = None,
        _ => {}
    }
}

fn handle_command_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.exit_command(),
        KeyCode::Enter => app.apply_command(),
        KeyCode::Up => {
            if let Some(last) = app.command.last.clone() {
                app.command.input = last;
            }
        }
        KeyCode::Backspace => {
            app.command.input.pop();
        }
        KeyCode::Char(ch) => app.command.input.push(ch),
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if app.help_open || app.input_mode == InputMode::Command {
        return;
    }
    if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
        return;
    }
    let Some(size) = terminal_rect() else {
        return;
    };
    handle_click(app, ui::layout::areas(size), mouse.column, mouse.row);
}

fn handle_click(app: &mut App, areas: UiAreas, col: u16, row: u16) {
    let view = &app.view;
    if UiAreas::hit(areas.deposit_button, col, row) {
        // Disabled buttons do nothing
        if view.can_transact() {
            app.dispatch(Msg::DepositRequested);
        }
    } else if UiAreas::hit(areas.withdraw_button, col, row) {
        if view.can_transact() {
            app.dispatch(Msg::WithdrawRequested);
        }
    } else if UiAreas::hit(areas.card, col, row) && view.has_provider() && view.account.is_none() {
        app.dispatch(Msg::ConnectRequested);
    }
}

fn terminal_rect() -> Option<Rect> {
    let (width, height) = crossterm::terminal::size().ok()?;
    Some(Rect::new(0, 0, width, height))
}

fn copy_to_clipboard(app: &mut App, text: String) {
    use arboard::Clipboard;

    match Clipboard::new() {
        Ok(mut clipboard) => {
            if clipboard.set_text(&text).is_ok() {
                app.set_status(format!("Copied: {text}"), StatusLevel::Info);
            } else {
                app.set_status("Failed to copy to clipboard", StatusLevel::Error);
            }
        }
        Err(_) => {
            app.set_status("Clipboard not available", StatusLevel::Error);
        }
    }
}
