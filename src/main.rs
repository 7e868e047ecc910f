//! AgroMind - Terminal Crop Advisory Client
//!
//! Resolves the farm's location, requests crop recommendations, answers
//! agronomy questions and shows the community tips feed, all against a remote
//! advisory service.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;

use agromind::application::Session;
use agromind::domain::Coordinates;
use agromind::infrastructure::{
    ClientConfig, FixedPosition, GeoProvider, HttpAdvisoryClient, NoGeolocation, init_tracing,
    load_config_or_default, validate_config,
};
use agromind::presentation::{InputHandler, Screen, render_ui};

#[derive(Debug, Parser)]
#[command(name = "agromind", about = "Terminal crop advisory client")]
struct Cli {
    /// JSON configuration file; defaults apply when it does not exist
    #[arg(long, default_value = "agromind.json")]
    config: PathBuf,
    /// Advisory service base URL
    #[arg(long)]
    api_base: Option<String>,
    /// Device latitude
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,
    /// Device longitude
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,
    /// Locale tag sent with every request (e.g. ta-IN)
    #[arg(long)]
    locale: Option<String>,
    #[arg(long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<ClientConfig> {
        let mut config = load_config_or_default(&self.config)
            .with_context(|| format!("load config {}", self.config.display()))?;
        if let Some(api_base) = self.api_base {
            config.api_base = api_base;
        }
        if let (Some(lat), Some(lon)) = (self.lat, self.lon) {
            config.device_location = Some(Coordinates { lat, lon });
        }
        if let Some(locale) = self.locale {
            config.locale = Some(locale);
        }
        if self.verbose {
            config.log_level = "debug".to_string();
        }
        validate_config(&config)?;
        Ok(config)
    }
}

struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn enter() -> anyhow::Result<Self> {
        enable_raw_mode().context("enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).context("enter alt screen")?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend).context("create terminal")?;
        Ok(Self { terminal })
    }

    fn terminal_mut(&mut self) -> &mut Terminal<CrosstermBackend<io::Stdout>> {
        &mut self.terminal
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Entry point: one session, one logical thread.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse().into_config()?;
    init_tracing(&config.log_level, config.log_file.as_deref());

    let locale = config.resolve_locale();
    let api = HttpAdvisoryClient::new(config.api_base.clone()).context("build advisory client")?;
    let geo: Arc<dyn GeoProvider> = match config.device_location {
        Some(coords) => Arc::new(FixedPosition(coords)),
        None => Arc::new(NoGeolocation),
    };
    info!(api_base = %api.base_url(), locale = %locale, "starting session");

    let mut session = Session::new(Arc::new(api), locale);
    session.start(geo);

    run_app(&mut session).await
}

/// Main event loop.
///
/// Frames are drawn from the session's published snapshots. The loop redraws
/// after every key press and every flow outcome, and runs until the user quits
/// or the terminal event stream ends.
async fn run_app(session: &mut Session) -> anyhow::Result<()> {
    let mut term = TerminalGuard::enter()?;
    let mut screen = Screen::default();
    let mut events = EventStream::new();
    let mut snapshots = session.subscribe();
    let locale = session.language().to_string();

    loop {
        term.terminal_mut()
            .draw(|f| render_ui(f, &snapshots.borrow_and_update(), &screen, &locale))
            .context("draw frame")?;

        tokio::select! {
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    // The snapshot guard must be released before dispatch publishes.
                    let action = {
                        let state = snapshots.borrow();
                        InputHandler::handle_key_event(&mut screen, &state, key.code, key.modifiers)
                    };
                    if let Some(action) = action {
                        session.dispatch(action);
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(err).context("read terminal event"),
                None => break,
            },
            _ = session.next_outcome() => {}
        }

        if screen.should_quit {
            break;
        }
    }

    Ok(())
}
