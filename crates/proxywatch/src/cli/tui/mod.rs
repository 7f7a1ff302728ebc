//! Terminal User Interface for proxywatch
//!
//! One live view at a time. The view keeps polling in the background while
//! the event loop waits for input.

pub mod app;
pub mod event;
pub mod ui;

use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use crossterm::{
    cursor::Show,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use proxywatch_live::Location;
use proxywatch_protocol::Page;
use ratatui::{backend::CrosstermBackend, prelude::*, Terminal};
use tracing::{error, info, warn};

use crate::cli::error::HelpfulError;
use crate::cli::tui::app::App;
use crate::cli::tui::event::{Event, EventHandler};
use crate::cli::{http_fetcher, load_config};

const INPUT_POLL: Duration = Duration::from_millis(250);
const REDRAW_INTERVAL: Duration = Duration::from_secs(1);

/// TUI command arguments
#[derive(Debug, Args)]
pub struct TuiArgs {
    /// Page to open: history, pool, blacklist or reverify
    #[arg(long, default_value = "history")]
    pub page: Page,

    /// Open a location instead, e.g. "/history?filter=StatusCode%3A404"
    #[arg(long, conflicts_with = "page")]
    pub location: Option<String>,
}

/// Resolve the page and location to open.
fn initial_location(args: &TuiArgs) -> Result<(Page, Location)> {
    let Some(raw) = &args.location else {
        return Ok((args.page, Location::new(args.page.as_str())));
    };
    let location = Location::parse(raw).map_err(|err| {
        HelpfulError::new(format!("Invalid location: {}", raw))
            .with_context(err.to_string())
            .with_suggestion("TRY: proxywatch tui --location '/history?filter=StatusCode%3A404'")
    })?;
    let page = Page::from_path(location.path()).ok_or_else(|| {
        HelpfulError::new(format!("No page at {}", location.path()))
            .with_suggestion("TRY: Use one of /history, /pool, /blacklist, /reverify")
    })?;
    Ok((page, location))
}

/// Run the TUI
pub fn run(args: TuiArgs) -> Result<()> {
    let (page, location) = initial_location(&args)?;
    let config = load_config()?;
    let fetcher = Arc::new(http_fetcher(&config)?);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    rt.block_on(async move {
        info!(%page, location = %location, base_url = %config.base_url, "starting tui");
        let mut app = App::new(config, fetcher, page, location);
        run_terminal(&mut app).await
    })
}

/// Restores the terminal and the panic hook when dropped, on every exit path.
struct TerminalGuard {
    restore_hook: Option<Box<dyn FnOnce()>>,
    raw_mode: bool,
    alternate_screen: bool,
}

impl TerminalGuard {
    /// Panics inside panels are caught and drawn; keep the default hook from
    /// writing over the alternate screen.
    fn install() -> Self {
        let default_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(|info| error!(%info, "panic in tui")));
        Self {
            restore_hook: Some(Box::new(move || std::panic::set_hook(default_hook))),
            raw_mode: false,
            alternate_screen: false,
        }
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.alternate_screen {
            if let Err(err) = execute!(stdout(), LeaveAlternateScreen, Show) {
                warn!(%err, "failed to leave alternate screen");
            }
        }
        if self.raw_mode {
            if let Err(err) = disable_raw_mode() {
                warn!(%err, "failed to disable raw mode");
            }
        }
        if let Some(restore) = self.restore_hook.take() {
            restore();
        }
    }
}

async fn run_terminal(app: &mut App) -> Result<()> {
    let mut guard = TerminalGuard::install();

    enable_raw_mode().context("Failed to enable raw mode")?;
    guard.raw_mode = true;
    execute!(stdout(), EnterAlternateScreen).context("Failed to enter alternate screen")?;
    guard.alternate_screen = true;

    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    let mut events = EventHandler::new(INPUT_POLL);
    let result = run_app(&mut terminal, app, &mut events).await;
    info!(location = %app.view.location(), "tui closed");

    drop(guard);
    result
}

/// Run the application loop. Redraws after input or a new snapshot, and at
/// least once per `REDRAW_INTERVAL` so record ages advance.
async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while app.running {
        terminal.draw(|frame| ui::draw(frame, app))?;

        tokio::select! {
            event = events.next() => match event {
                Some(Event::Key(key)) => app.handle_key(key),
                Some(Event::Resize(_, _)) => {} // Ratatui handles resize
                None => {
                    warn!("terminal input closed; leaving tui");
                    app.running = false;
                }
            },
            _ = app.view.changed() => {}
            _ = tokio::time::sleep(REDRAW_INTERVAL) => {}
        }
    }
    Ok(())
}
