mod api;
mod channel;
mod inspector;
mod palette;
mod session;
mod state;
mod theme;
mod ui;

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{fmt::writer::BoxMakeWriter, EnvFilter};
use url::Url;

use crate::api::ApiClient;
use crate::channel::{ChannelConfig, ConnectionChannel};
use crate::state::App;

const UPDATE_QUEUE_CAPACITY: usize = 256;
const REDRAW_INTERVAL_MS: u64 = 250;
const DEFAULT_SERVER: &str = "http://127.0.0.1:8080";

#[derive(Parser, Debug)]
#[command(name = "cavewatch-console", about = "Terminal console for a cave survival simulation")]
struct Args {
    /// Base URL of the simulation server (CAVEWATCH_SERVER)
    #[arg(long, default_value = "")]
    server: String,
    /// Directory for the session log file (CAVEWATCH_LOG_DIR); off when empty
    #[arg(long, default_value = "")]
    log_dir: String,
}

#[derive(Clone, Debug)]
struct Config {
    server: Url,
    log_dir: String,
    log_stdout: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;
    let _log_guard = init_logging(&config);
    info!("cavewatch_start: server={}", config.server);

    let api = ApiClient::new(&config.server)?;
    let ws_url = channel::websocket_url(&config.server)
        .with_context(|| format!("cannot derive a websocket url from {}", config.server))?;

    let (update_tx, mut update_rx) = mpsc::channel(UPDATE_QUEUE_CAPACITY);
    let mut app = App::new(api.clone(), update_tx.clone());
    let _channel = ConnectionChannel::spawn(ChannelConfig::new(ws_url), api, update_tx);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let mut events = EventStream::new();
    let mut redraw = tokio::time::interval(Duration::from_millis(REDRAW_INTERVAL_MS));

    loop {
        terminal.draw(|frame| ui::render(frame, &mut app))?;
        tokio::select! {
            _ = redraw.tick() => {}
            Some(update) = update_rx.recv() => {
                app.apply_update(update);
            }
            maybe_event = events.next() => {
                if let Some(Ok(Event::Key(key))) = maybe_event {
                    if key.kind == KeyEventKind::Press {
                        app.handle_key(key);
                    }
                }
            }
        }
        if app.should_quit {
            break;
        }
    }

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    info!("cavewatch_exit");
    Ok(())
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let server = resolve_server(&args.server)?;
    let log_dir = resolve_log_dir(&args.log_dir);
    let log_stdout = matches!(
        std::env::var("CAVEWATCH_LOG_STDOUT").ok().as_deref(),
        Some("1") | Some("true") | Some("TRUE") | Some("yes") | Some("YES")
    );
    Ok(Config {
        server,
        log_dir,
        log_stdout,
    })
}

fn resolve_server(flag: &str) -> anyhow::Result<Url> {
    let mut raw = flag.trim().to_string();
    if raw.is_empty() {
        if let Ok(value) = std::env::var("CAVEWATCH_SERVER") {
            raw = value.trim().to_string();
        }
    }
    if raw.is_empty() {
        raw = DEFAULT_SERVER.to_string();
    }
    Url::parse(&raw).with_context(|| format!("invalid server url: {raw}"))
}

fn resolve_log_dir(flag: &str) -> String {
    if !flag.trim().is_empty() {
        return flag.trim().to_string();
    }
    if let Ok(value) = std::env::var("CAVEWATCH_LOG_DIR") {
        if !value.trim().is_empty() {
            return value.trim().to_string();
        }
    }
    String::new()
}

struct LogGuard {
    file: Option<Arc<StdMutex<std::fs::File>>>,
}

struct MultiWriter {
    stdout_enabled: bool,
    file: Option<Arc<StdMutex<std::fs::File>>>,
}

impl MultiWriter {
    fn new(file: Option<Arc<StdMutex<std::fs::File>>>, stdout_enabled: bool) -> Self {
        Self {
            stdout_enabled,
            file,
        }
    }
}

impl Write for MultiWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.stdout_enabled {
            let _ = io::stdout().write_all(buf);
        }
        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                let _ = file.write_all(buf);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.stdout_enabled {
            let _ = io::stdout().flush();
        }
        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                let _ = file.flush();
            }
        }
        Ok(())
    }
}

// with no log dir and no stdout override the writer goes nowhere, which
// keeps the alternate screen clean
fn init_logging(config: &Config) -> Option<LogGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let guard = match open_log_file(&config.log_dir) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("log_file_error: {err}");
            LogGuard { file: None }
        }
    };
    let file = guard.file.clone();
    let stdout_enabled = config.log_stdout;
    let make_writer = BoxMakeWriter::new(move || MultiWriter::new(file.clone(), stdout_enabled));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(make_writer)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        return None;
    }
    Some(guard)
}

fn open_log_file(log_dir: &str) -> io::Result<LogGuard> {
    if log_dir.trim().is_empty() {
        return Ok(LogGuard { file: None });
    }
    let dir = PathBuf::from(log_dir);
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(format!("cavewatch-{}.log", std::process::id()));
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(LogGuard {
        file: Some(Arc::new(StdMutex::new(file))),
    })
}
