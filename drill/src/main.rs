//! Scenario-response training TUI.
//!
//! A terminal front end for the HIPAA compliance trainer and the cyber
//! incident-response simulation. Trainees generate scenarios, pick
//! responses and ask follow-up questions; facilitators can reveal notes,
//! clear the history and reset the score.
//!
//! # Headless Mode
//!
//! Run with `--headless` for a text-based interface suitable for automated testing:
//!
//! ```bash
//! cargo run -p drill -- --headless --profile incident
//! ```

mod app;
mod cli;
mod events;
mod headless;
mod ui;

use std::fs::OpenOptions;
use std::io::{self, stdout};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use drill_core::{ClaudeOracle, ConfigError, ScenarioEngine, SharedEngine, TextOracle};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing_subscriber::EnvFilter;

use app::App;
use cli::Args;
use events::{handle_event, EventResult};
use ui::render::render;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_logging(&args)?;

    let profile = args.load_profile().context("Failed to load profile")?;

    let oracle = match ClaudeOracle::from_env(args.oracle_config()) {
        Ok(oracle) => oracle,
        Err(ConfigError::MissingCredential) => {
            eprintln!("Error: ANTHROPIC_API_KEY environment variable not set.");
            eprintln!("Please set it in .env file or with: export ANTHROPIC_API_KEY=your_key_here");
            std::process::exit(1);
        }
        Err(e) => return Err(e).context("Failed to create the oracle client"),
    };

    let engine = ScenarioEngine::new(oracle, profile.clone())
        .context("Profile is not usable")?
        .with_oracle_timeout(args.oracle_timeout());
    tracing::info!(profile = %profile.name, headless = args.headless, "starting session");

    if args.headless {
        let mut engine = engine;
        let stdin = io::stdin();
        let mut stdout = stdout();
        headless::run_headless(&mut engine, stdin.lock(), &mut stdout).await?;
        return Ok(());
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, App::new(SharedEngine::new(engine), profile)).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result.context("Terminal error")
}

/// Install the tracing subscriber.
///
/// Headless runs log to stderr. The TUI owns the terminal, so it only
/// logs when `--log-file` is given.
fn init_logging(args: &Args) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if let Some(path) = &args.log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init();
    } else if args.headless {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .with_target(false)
            .init();
    }
    Ok(())
}

async fn run_app<B, O>(terminal: &mut Terminal<B>, mut app: App<O>) -> io::Result<()>
where
    B: ratatui::backend::Backend,
    O: TextOracle + 'static,
{
    loop {
        app.poll_responses();

        terminal.draw(|f| render(f, &app))?;

        // Poll with a timeout so background results and the spinner keep moving
        if event::poll(Duration::from_millis(100))? {
            let ev = event::read()?;
            if handle_event(&mut app, ev) == EventResult::Quit {
                return Ok(());
            }
        } else {
            app.tick();
        }
    }
}
