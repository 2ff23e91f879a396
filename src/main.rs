//! livescroll-news — a live-updating news feed for the terminal.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌──────────────┐ Subscription ┌──────────┐  draw()  ┌──────────┐
//! │ NewsAdapter  │ ───────────► │  app.rs  │ ───────► │  ui.rs   │
//! │ (lib, timer) │  (channel)   │ (state)  │          │ (render) │
//! └──────────────┘              └──────────┘          └──────────┘
//!                                    ▲
//!                                    │ handle_key_event()
//!                               ┌──────────┐
//!                               │ input.rs │
//!                               └──────────┘
//! ```
//!
//! * **`cli`** — flags, env vars and config-file resolution.
//! * **`app`** — owns the on-screen articles, scroll position and status.
//! * **`ui`** — pure rendering: reads `App` state and draws widgets.
//! * **`input`** — maps key events to `App` mutations.
//! * **`main`** — wires everything together: parse args, set up logging and
//!   the terminal, start the stream and run the event loop.

mod app;
mod cli;
mod input;
mod ui;

use std::fs::File;
use std::io;
use std::sync::Mutex;
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
use tracing::info;
use tracing_subscriber::EnvFilter;

use app::App;
use cli::Cli;
use livescroll_news::{NewsAdapter, Subscription};

// ---------------------------------------------------------------------------
// RAII terminal guard — idiomatic cleanup even on panic
// ---------------------------------------------------------------------------

/// Manages terminal raw-mode and alternate-screen lifetime via [`Drop`].
///
/// Constructing this struct enters raw mode + alternate screen.  When the
/// value is dropped (normally or during stack unwinding) it restores the
/// terminal.
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

/// Logs go to `--log-file` when given.  Otherwise `--once` logs to stderr
/// and the TUI discards them, since it owns the terminal.
fn init_tracing(cli: &Cli) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match (&cli.log_file, cli.once) {
        (Some(path), _) => {
            let file = File::create(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        (None, true) => builder.with_writer(io::stderr).init(),
        (None, false) => builder.with_writer(io::sink).init(),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli)?;

    let config = cli.feed_config()?;
    let mut adapter = NewsAdapter::with_http(config)?;
    for keyword in &cli.keywords {
        adapter.add_query_param(keyword.as_str());
    }

    if cli.once {
        let articles = adapter.fetch_once()?;
        println!("{}", serde_json::to_string_pretty(&articles)?);
        return Ok(());
    }

    // Subscribe before starting so the very first batch is not missed.
    let subscription = adapter.subscribe();
    adapter.start_stream()?;

    install_panic_hook();
    let result = run_tui(&adapter, &subscription);

    adapter.stop_stream();
    info!("exiting");
    result
}

/// The main event loop.  Runs at ~10 fps (100 ms tick).  Each iteration:
///   1. Drain any articles delivered to our subscription.
///   2. Refresh the status line and render.
///   3. Poll for keyboard input (non-blocking, up to tick_rate).
fn run_tui(adapter: &NewsAdapter, subscription: &Subscription) -> Result<()> {
    // `guard` is dropped on return, restoring the terminal.
    let mut guard = TerminalGuard::new()?;
    let mut app = App::new(adapter.keywords());
    let tick_rate = Duration::from_millis(100);

    loop {
        app.merge_items(subscription.try_iter());
        app.update_status(adapter.state().as_ref(), adapter.scheduler_stats());

        guard.terminal.draw(|f| ui::draw(&mut app, f))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                input::handle_key_event(&mut app, key);
            }
        }

        if app.quit {
            return Ok(());
        }
    }
}
