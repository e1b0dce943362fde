//! Live airflow meter.
//!
//! Owns the event loop and wires together all background tasks:
//! - Transport task (sensor byte stream, one session per connection)
//! - Control input (stdin commands, Ctrl-C)
//! - Config file watcher (live reload on change)
//!
//! Every task only sends [`Message`]s; the loop in [`run`] is the single
//! owner of the statistics window and the current session.

pub mod control;
pub mod display;
pub mod transport;

pub use display::Display;

use cfm_config::{load as load_config, ConfigWatcher, MeterConfig, Origin, SourceConfig};
use cfm_core::{Message, MeterError, Result};
use cfm_protocol::Session;
use cfm_stats::StatsWindow;
use std::io::Write;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// What the loop should do after handling a message.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Nothing to show.
    Idle,
    /// Print this line.
    Frame(String),
    /// Stop the meter.
    Quit,
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Start the meter with `config` (loaded from `config_path`).  Returns when
/// the user quits or the transport stops for good.
pub async fn run(config_path: PathBuf, config: MeterConfig) -> Result<()> {
    let (tx, mut rx) = mpsc::channel(64);

    let mut transport = transport::spawn(
        config.source.clone(),
        config.reconnect.clone(),
        config.protocol.read_buffer,
        tx.clone(),
    );
    if config.source != SourceConfig::Stdin {
        control::spawn_commands(tx.clone());
    }
    control::spawn_ctrl_c(tx.clone());
    spawn_config_stream(config_path.clone(), tx);

    let mut meter = Meter::new(config_path, config)?;

    loop {
        // Queued messages first: the transport's last `SessionEnded` is
        // already in the channel by the time its task completes.
        let msg = tokio::select! {
            biased;
            msg = rx.recv() => msg,
            _ = &mut transport => {
                info!("Transport finished");
                None
            }
        };
        let Some(msg) = msg else { break };

        match meter.update(msg)? {
            Step::Idle => {}
            Step::Frame(line) => {
                let mut stdout = std::io::stdout().lock();
                if let Err(e) = writeln!(stdout, "{line}").and_then(|()| stdout.flush()) {
                    // Downstream pipe closed; nobody is watching any more.
                    warn!("Cannot write to stdout: {e}");
                    break;
                }
            }
            Step::Quit => break,
        }
    }

    info!("Meter stopped");
    Ok(())
}

// ── State ─────────────────────────────────────────────────────────────────────

/// The meter's state: one statistics window for the process lifetime, and
/// the parsing session of the current connection.
pub struct Meter {
    config_path: PathBuf,
    config:      MeterConfig,
    window:      StatsWindow,
    session:     Option<Session>,
    display:     Display,
}

impl Meter {
    pub fn new(config_path: PathBuf, config: MeterConfig) -> Result<Self> {
        Ok(Self {
            window:  StatsWindow::new(config.stats.capacity)?,
            display: Display::new(config.display.clone()),
            session: None,
            config_path,
            config,
        })
    }

    pub fn window(&self) -> &StatsWindow {
        &self.window
    }

    // ── Update ────────────────────────────────────────────────────────────────

    pub fn update(&mut self, msg: Message) -> Result<Step> {
        match msg {
            Message::SessionStarted(label) => {
                if let Some(mut old) = self.session.take() {
                    if !old.is_ended() {
                        warn!("{} replaced before it ended", old.label());
                        old.end();
                    }
                }
                if self.config.stats.reset_on_reconnect {
                    self.window.reset();
                }
                info!("Session started: {label}");
                self.session = Some(Session::new(label, self.config.protocol.max_line_len));
                Ok(Step::Idle)
            }
            Message::Chunk(bytes) => {
                let session = self.session.as_mut().ok_or(MeterError::SessionClosed)?;
                let samples = session.feed(&bytes, &mut self.window)?;
                if samples.is_empty() {
                    return Ok(Step::Idle);
                }
                self.frame()
            }
            Message::SessionEnded(reason) => {
                if let Some(session) = self.session.as_mut() {
                    let dropped = session.end();
                    info!(
                        dropped_bytes = dropped,
                        "Session {} ended ({reason}); statistics kept",
                        session.label()
                    );
                }
                Ok(Step::Idle)
            }
            Message::ConfigReloaded => {
                self.reload();
                Ok(Step::Idle)
            }
            Message::ResetRequested => {
                self.window.reset();
                info!("Statistics reset");
                self.frame()
            }
            Message::Shutdown => Ok(Step::Quit),
        }
    }

    fn frame(&self) -> Result<Step> {
        match self.display.render(&self.window.snapshot()) {
            Ok(line) => Ok(Step::Frame(line)),
            Err(e) => {
                error!("Cannot render snapshot: {e}");
                Ok(Step::Idle)
            }
        }
    }

    fn reload(&mut self) {
        let cfg = match load_config(&self.config_path) {
            Ok((cfg, Origin::File)) => cfg,
            Ok((cfg, Origin::Defaults)) => {
                warn!("Config file {} is gone; reverting to defaults", self.config_path.display());
                cfg
            }
            Err(e) => {
                warn!("Config reload failed: {e}");
                return;
            }
        };

        if let Err(e) = self.window.set_capacity(cfg.stats.capacity) {
            warn!("Keeping window capacity {}: {e}", self.window.capacity());
        }
        self.display.set_config(cfg.display.clone());
        if cfg.source != self.config.source || cfg.reconnect != self.config.reconnect {
            warn!("Transport settings changed; restart the meter to apply them");
        }
        if cfg.protocol.max_line_len != self.config.protocol.max_line_len {
            info!("New line length limit applies from the next session");
        }

        info!("Config reloaded");
        self.config = cfg;
    }
}

// ── Background streams ────────────────────────────────────────────────────────

/// Watches the config file for writes and sends `ConfigReloaded`.
fn spawn_config_stream(path: PathBuf, tx: mpsc::Sender<Message>) {
    let (watcher, mut rx) = match ConfigWatcher::spawn(&path) {
        Ok(pair) => pair,
        Err(e) => {
            warn!("Config hot-reload disabled: {e}");
            return;
        }
    };

    tokio::spawn(async move {
        let _watcher = watcher;
        while rx.recv().await.is_some() {
            if tx.send(Message::ConfigReloaded).await.is_err() {
                break;
            }
        }
    });
}
