// src/main.rs

use color_eyre::eyre::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

mod app;
mod config;
mod core;
mod logging;
mod ui;

use app::{App, AppState};
use config::Settings;
use core::models::{ScanOutcome, TargetRequest};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let log_path = logging::initialize_logging()?;
    info!(log = %log_path.display(), "Starting route divergence scanner.");

    let settings = Settings::load();
    let settings = match settings.validate() {
        Ok(()) => settings,
        Err(e) => {
            warn!(error = %e, "Invalid settings, using defaults.");
            Settings::default()
        }
    };

    // --- Setup ---
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(EnableMouseCapture)?;
    enable_raw_mode()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.clear()?;

    let mut app = App::new(settings);
    let (tx, mut rx) = mpsc::channel(1);

    let result = run(&mut terminal, &mut app, &tx, &mut rx).await;

    // --- Restore Terminal ---
    stdout().execute(LeaveAlternateScreen)?;
    stdout().execute(DisableMouseCapture)?;
    disable_raw_mode()?;
    info!("Shutting down.");
    result
}

async fn run<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    tx: &mpsc::Sender<ScanOutcome>,
    rx: &mut mpsc::Receiver<ScanOutcome>,
) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        if event::poll(Duration::from_millis(100))? {
            handle_events(app, tx)?;
        }

        if let Ok(outcome) = rx.try_recv() {
            info!(host = %outcome.target.host, status = %outcome.status, "Scan finished.");
            app.finish_scan(outcome);
        }
        app.on_tick();
    }
    Ok(())
}

fn handle_events(app: &mut App, tx: &mpsc::Sender<ScanOutcome>) -> Result<()> {
    if let Event::Key(key) = event::read()? {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }
        if app.show_disclaimer {
            match key.code {
                KeyCode::Enter => app.show_disclaimer = false,
                KeyCode::Char('q') => app.quit(),
                _ => {}
            }
            return Ok(());
        }
        match app.state {
            AppState::Idle => handle_idle_input(app, key.code, tx),
            AppState::Finished => handle_finished_input(app, key.code),
            AppState::Scanning => {
                if key.code == KeyCode::Char('q') {
                    app.quit();
                }
            }
        }
    }
    Ok(())
}

fn handle_idle_input(app: &mut App, key_code: KeyCode, tx: &mpsc::Sender<ScanOutcome>) {
    match key_code {
        KeyCode::Char('q') if app.input.is_empty() => app.quit(),
        KeyCode::Char(c) => app.input.push(c),
        KeyCode::Backspace => {
            app.input.pop();
        }
        KeyCode::Esc => app.quit(),
        KeyCode::Enter => {
            if app.input.trim().is_empty() {
                return;
            }
            let target = match TargetRequest::parse(app.input.trim(), app.settings.https_port) {
                Ok(target) => target,
                Err(e) => {
                    warn!(input = %app.input, error = %e, "Rejected target.");
                    app.input_error = Some(e.to_string());
                    return;
                }
            };
            app.input_error = None;
            app.state = AppState::Scanning;

            let session = app.session_for(&target.host);
            let tx = tx.clone();
            tokio::spawn(async move {
                let outcome = session.run(&target).await;
                let _ = tx.send(outcome).await;
            });
        }
        _ => {}
    }
}

fn handle_finished_input(app: &mut App, key_code: KeyCode) {
    match key_code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('n') => app.reset(),
        KeyCode::Char('e') => app.export_findings(&logging::get_data_dir()),
        KeyCode::Char('c') => app.clear_findings(),
        KeyCode::Up => app.scroll_up(),
        KeyCode::Down => app.scroll_down(),
        _ => {}
    }
}
