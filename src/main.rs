mod app;
mod config;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::info;

use logscope_logs::{LiveStreamController, LogStore, Session, StreamEvent};
use logscope_source::DirSource;
use logscope_tui::{Action, Event, EventHandler, HelpOverlay, KeyBindings, LogViewerScreen, Tui};

use crate::app::{App, InternalAction};
use crate::config::Config;

/// logscope - a terminal viewer for log files with a live follow mode
#[derive(Parser, Debug)]
#[command(name = "logscope")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory containing the *.log files
    #[arg(long, value_name = "PATH")]
    dir: Option<PathBuf>,

    /// Load this file on start
    #[arg(long, value_name = "NAME")]
    file: Option<String>,

    /// Start streaming on start
    #[arg(long)]
    live: bool,

    /// Maximum lines kept while streaming
    #[arg(long, value_name = "N")]
    capacity: Option<usize>,

    /// Config file (defaults to <config dir>/logscope/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Fail a live stream that yields no line within this many seconds
    #[arg(long, value_name = "SECS")]
    connect_timeout: Option<u64>,
}

impl Args {
    /// Command line flags win over the config file
    fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.dir {
            config.logs_dir = dir.clone();
        }
        if let Some(capacity) = self.capacity {
            config.live_capacity = capacity;
        }
        if let Some(secs) = self.connect_timeout {
            config.connect_timeout_secs = Some(secs);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = run_app(args).await;

    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

async fn run_app(args: Args) -> Result<()> {
    let mut config = Config::load(args.config.as_deref())?;
    args.apply(&mut config);
    info!(dir = %config.logs_dir.display(), capacity = config.live_capacity, "starting");

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let (internal_tx, mut internal_rx) = mpsc::unbounded_channel::<InternalAction>();
    let (stream_tx, mut stream_rx) = mpsc::unbounded_channel::<StreamEvent>();

    let source = DirSource::new(&config.logs_dir)
        .with_poll_interval(config.poll_interval())
        .with_default_stream_file(config.default_stream_file.clone());

    let session = Session::new(
        LogStore::with_capacity(config.live_capacity),
        LiveStreamController::new().with_connect_timeout(config.connect_timeout()),
    );
    let mut app = App::new(
        session,
        source,
        config.export_dir.clone(),
        internal_tx,
        stream_tx,
    );

    app.start(args.file.as_deref(), args.live).await;

    let mut tui = Tui::new()?;
    let mut events = EventHandler::new(config.tick_rate());
    let keybindings = KeyBindings::new();

    render(&mut tui, &mut app)?;

    loop {
        tokio::select! {
            Some(event) = events.next() => {
                match event {
                    Event::Key(key) => {
                        if let Some(action) = app.key_action(&keybindings, &key) {
                            let _ = action_tx.send(action);
                        }
                    }
                    Event::Resize(_, _) => {
                        let _ = action_tx.send(Action::Render);
                    }
                    Event::Tick => {}
                    Event::Error(e) => {
                        tracing::warn!(error = %e, "terminal input error");
                    }
                }
            }

            Some(event) = stream_rx.recv() => {
                app.handle_stream_event(event);
            }

            Some(action) = action_rx.recv() => {
                app.handle_action(action);
            }

            Some(internal) = internal_rx.recv() => {
                app.handle_internal(internal);
            }
        }

        if app.ui.should_quit {
            break;
        }

        if app.ui.render_dirty {
            render(&mut tui, &mut app)?;
        }
    }

    events.shutdown();
    tui.restore()?;

    Ok(())
}

fn render(tui: &mut Tui, app: &mut App<DirSource>) -> Result<()> {
    tui.draw(|frame| {
        LogViewerScreen::render(frame, &app.session, &mut app.ui);
        if app.ui.help_visible {
            HelpOverlay::render(frame);
        }
    })?;
    app.ui.render_dirty = false;
    Ok(())
}
