use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use arboard::Clipboard;
use clap::Parser;
use crossterm::{
    event::{self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_subscriber::EnvFilter;

use drape_tui::action::Action;
use drape_tui::app::App;
use drape_tui::backend::{AnalysisService, HttpAnalysisClient, OfflineAnalysisService};
use drape_tui::config::{Config, ConfigOverrides};
use drape_tui::ui::draw;
use drape_tui::ui_state::Screen;
use drape_tui::weather::{OfflineWeatherProvider, OpenMeteoClient, WeatherProvider};

/// Terminal fashion assistant.
#[derive(Parser, Debug)]
#[command(name = "drape", version, about)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "DRAPE_CONFIG")]
    config: Option<PathBuf>,

    /// Base URL of the analysis service
    #[arg(long, env = "DRAPE_API_BASE")]
    api_base: Option<String>,

    /// Run without contacting any remote service
    #[arg(short, long)]
    offline: bool,

    /// Where to write logs (the terminal belongs to the UI)
    #[arg(long, env = "DRAPE_LOG_FILE")]
    log_file: Option<PathBuf>,
}

fn init_logging(config: &Config) -> Result<()> {
    if let Some(parent) = config.log_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {:?}", parent))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .with_context(|| format!("Failed to open log file {:?}", config.log_file))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("drape_tui=info,drape=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load(
        args.config.as_deref(),
        ConfigOverrides {
            api_base: args.api_base,
            log_file: args.log_file,
            offline: args.offline,
        },
    )
    .context("Failed to load configuration")?;
    init_logging(&config)?;
    info!(api = %config.api_base, offline = config.offline, "starting drape");

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;

    let service: Arc<dyn AnalysisService> = if config.offline {
        Arc::new(OfflineAnalysisService)
    } else {
        Arc::new(
            HttpAnalysisClient::new(&config.api_base, config.request_timeout())
                .context("Failed to create analysis client")?,
        )
    };
    let weather: Arc<dyn WeatherProvider> = if config.offline {
        Arc::new(OfflineWeatherProvider::new(config.weather.location_name.clone()))
    } else {
        Arc::new(
            OpenMeteoClient::new(config.weather.clone(), config.request_timeout())
                .context("Failed to create weather client")?,
        )
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, service, weather, runtime.handle().clone());
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableBracketedPaste)?;
    terminal.show_cursor()?;

    info!("shutting down");
    result
}

/// Pasted text goes on the single input line.
fn flatten(text: &str) -> String {
    text.chars()
        .filter(|c| *c != '\r')
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect()
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    let tick_rate = app.config.tick_rate();
    loop {
        app.drain_events();
        app.tick();

        terminal.draw(|frame| draw(frame, app))?;

        if app.should_quit {
            return Ok(());
        }

        if !event::poll(tick_rate)? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Esc => {
                    if app.showing_command_popup() {
                        app.reset_command_selection();
                        app.ui.input.clear();
                    } else if app.ui.show_help {
                        app.ui.show_help = false;
                    } else if app.ui.input.is_empty() {
                        return Ok(());
                    } else {
                        app.ui.input.clear();
                    }
                }
                KeyCode::Enter => {
                    if app.showing_command_popup() && app.ui.command_selection.is_some() {
                        app.apply_command_selection();
                    } else {
                        app.submit_input();
                    }
                }
                KeyCode::Tab => {
                    if app.showing_command_popup() && app.ui.command_selection.is_some() {
                        app.apply_command_selection();
                    } else {
                        let next = app.ui.screen.next();
                        app.dispatch(Action::Navigate(next));
                    }
                }
                KeyCode::Backspace => {
                    app.ui.input.pop();
                    app.reset_command_selection();
                }
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return Ok(());
                }
                KeyCode::Char('v') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    // Ctrl+V: Get clipboard content
                    if let Ok(mut clipboard) = Clipboard::new() {
                        if let Ok(text) = clipboard.get_text() {
                            app.ui.input.push_str(&flatten(&text));
                            app.reset_command_selection();
                        }
                    }
                }
                KeyCode::Char(c) => {
                    app.ui.input.push(c);
                    app.reset_command_selection();
                }
                KeyCode::Up => {
                    if app.showing_command_popup() {
                        app.command_select_up();
                    } else {
                        app.scroll_up();
                    }
                }
                KeyCode::Down => {
                    if app.showing_command_popup() {
                        app.command_select_down();
                    } else {
                        app.scroll_down();
                    }
                }
                KeyCode::F(2) if app.ui.screen == Screen::Chat => {
                    // F2: Toggle markdown raw/preview mode
                    app.toggle_markdown_mode();
                }
                _ => {}
            },
            Event::Paste(text) => {
                app.ui.input.push_str(&flatten(&text));
                app.reset_command_selection();
            }
            _ => {}
        }
    }
}
