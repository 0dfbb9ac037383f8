//! newsfeed-tui: browse the Guardian's newest articles from the terminal.
//!
//! ## Architecture overview
//!
//! ```text
//!                   start(config)               fetch() on a worker thread
//! ┌──────────┐ ──────────────────► ┌───────────┐ ─────────────────► ┌───────────┐
//! │  main.rs │                     │ loader.rs │                    │  source/  │
//! │ (owner)  │ ◄────────────────── │ (gens +   │ ◄───────────────── │ (gate,    │
//! └──────────┘  deliver(outcome)   │  state)   │   Completion       │  query,   │
//!      │  ▲       via poll()       └───────────┘   (channel)        │  fetch)   │
//!      │  │ handle_key_event()                                      └───────────┘
//!      ▼  │
//! ┌──────────┐  draw()  ┌──────────┐
//! │  app.rs  │ ───────► │  ui.rs   │
//! └──────────┘          └──────────┘
//! ```
//!
//! * **`source/`**: connectivity gate, query builder, Guardian fetcher and
//!   the `NewsItem` / `LoadOutcome` records.
//! * **`loader`**: the generation-tagged state machine that runs one fetch
//!   per load on a background thread and delivers on the owner thread.
//! * **`app`**: presentation state; the `ResultSink` for outcomes.
//! * **`ui`**: pure rendering: reads `App` state and draws widgets.
//! * **`input`**: maps key events to `App` mutations and commands.
//! * **`config`** / **`cli`**: settings file and flags.
//! * **`main`**: wires everything together: parse args, set up logging and
//!   the terminal, and run the event loop.

mod app;
mod cli;
mod config;
mod input;
mod loader;
mod source;
mod ui;

use std::fs::OpenOptions;
use std::io;
use std::process::{Command as Process, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use app::App;
use cli::Cli;
use config::{ConfigProvider, SessionConfig, Settings};
use input::Command;
use loader::{LoadState, LoaderController};
use source::{GuardianFetcher, TcpProbeGate};

// ---------------------------------------------------------------------------
// RAII terminal guard
// ---------------------------------------------------------------------------

/// Manages terminal raw-mode and alternate-screen lifetime via [`Drop`].
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Install a panic hook that restores the terminal before printing the
/// panic message.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

// ---------------------------------------------------------------------------
// Setup helpers
// ---------------------------------------------------------------------------

/// Log to a file; stdout belongs to the UI.  `RUST_LOG` wins over the
/// configured level.
fn init_tracing(settings: &Settings) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&settings.log.file)
        .with_context(|| format!("cannot open log file {}", settings.log.file.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .init();
    Ok(())
}

fn build_loader(settings: &Settings) -> Result<LoaderController> {
    let base = settings.base_url()?;
    let gate = TcpProbeGate::for_url(&base, settings.probe_timeout());
    let fetcher = GuardianFetcher::new(settings.http_timeout())
        .context("failed to build HTTP client")?;

    Ok(LoaderController::new(
        Box::new(gate),
        settings.query_builder(),
        base,
        Arc::new(fetcher),
    ))
}

/// Hand `url` to the platform's default browser.
fn open_in_browser(url: &str) -> io::Result<()> {
    #[cfg(target_os = "macos")]
    let mut cmd = Process::new("open");
    #[cfg(target_os = "windows")]
    let mut cmd = {
        let mut cmd = Process::new("cmd");
        cmd.args(["/C", "start", ""]);
        cmd
    };
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let mut cmd = Process::new("xdg-open");

    cmd.arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
}

fn start_load(loader: &mut LoaderController, app: &mut App) {
    let config = app.search_config();
    app.begin_loading();
    loader.start(&config, app);
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    // -- configuration -------------------------------------------------------
    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref()).context("loading settings")?;
    cli.apply(&mut settings);

    init_tracing(&settings)?;
    info!(base_url = %settings.api.base_url, "newsfeed starting");

    let mut loader = build_loader(&settings)?;
    let mut app = App::new(SessionConfig::new(settings.search_config()));

    // -- terminal setup (RAII, Drop restores on exit or panic) --------------
    install_panic_hook();
    let mut guard = TerminalGuard::new()?;

    start_load(&mut loader, &mut app);

    // -- main event loop -----------------------------------------------------
    // Runs at ~10 fps (100 ms tick).  Each iteration:
    //   1. Deliver any finished fetch for the current generation.
    //   2. Render the UI.
    //   3. Poll for keyboard input (non-blocking, up to tick_rate).
    let tick_rate = Duration::from_millis(100);

    loop {
        loader.poll(&mut app);

        guard.terminal.draw(|f| ui::draw(&mut app, f))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                match input::handle_key_event(&mut app, key) {
                    Some(Command::Reload) => start_load(&mut loader, &mut app),
                    Some(Command::Open(url)) => {
                        if let Err(e) = open_in_browser(&url) {
                            warn!(%url, error = %e, "could not open browser");
                        }
                    }
                    None => {}
                }
            }
        }

        if app.quit {
            break;
        }
    }

    // Host teardown: anything still in flight is dropped unseen.
    if loader.state() == LoadState::Loading {
        info!("abandoning in-flight load");
    }
    loader.reset();
    info!("newsfeed exiting");

    // `guard` is dropped here, restoring the terminal.
    Ok(())
}
