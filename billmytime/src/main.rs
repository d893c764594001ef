use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event as TermEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::fs::OpenOptions;
use std::io;
use std::ops::ControlFlow;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod display;
mod input;
mod ipc;
mod menu;
mod session;
mod tick;
mod timer;
mod ui;

use app::{App, Event};
use input::Key;
use session::Session;

const LOG_FILE: &str = "billmytime.log";

fn main() -> Result<()> {
    let config = config::load_config()?;
    init_logging()?;
    info!("Starting billmytime");

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let socket_path = config.transport.socket_path.clone();
    let (outbox, _) = broadcast::channel(16);
    let (events_tx, mut events) = mpsc::unbounded_channel();
    let listener = {
        let _guard = runtime.enter();
        ipc::server::bind(&socket_path)?
    };
    runtime.spawn(ipc::server::serve(listener, outbox.clone(), events_tx));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let session = Session::new(App::new(config), outbox);
    let res = run_app(&mut terminal, session, &mut events);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    runtime.shutdown_background();
    let _ = std::fs::remove_file(&socket_path);
    info!("Stopped billmytime");

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    mut session: Session,
    events: &mut mpsc::UnboundedReceiver<Event>,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, &session.app))?;

        if session.poll_tick(now()).is_break() || session.drain(events, now()).is_break() {
            return Ok(());
        }

        if event::poll(Duration::from_millis(100))? {
            if let TermEvent::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let flow = match input::map_key(key) {
                    Some(Key::Quit) => ControlFlow::Break(()),
                    Some(Key::Press(button, click)) => {
                        session.dispatch(Event::Button(button, click), now())
                    }
                    None => ControlFlow::Continue(()),
                };
                if flow.is_break() {
                    return Ok(());
                }
            }
        }
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Logs go to a file because the terminal belongs to the UI.
fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_env("BILLMYTIME_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let Some(dirs) = config::project_dirs() else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::sink)
            .try_init();
        return Ok(());
    };
    let data_dir = dirs.data_dir();
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory at {:?}", data_dir))?;
    let path = data_dir.join(LOG_FILE);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file at {:?}", path))?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}
