use cfm_core::{MeterError, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Editors emit several events per save; wait this long for the burst to end.
const SETTLE: Duration = Duration::from_millis(250);

/// Watches the meter config file and fires once per (debounced) change.
///
/// The parent directory is watched rather than the file itself, so the
/// watcher survives editors that save by rename and files that are created
/// after startup.  Watching stops when the handle is dropped.
pub struct ConfigWatcher {
    _inner: RecommendedWatcher,
}

impl ConfigWatcher {
    /// Start watching `path`.
    /// Returns the watcher handle and a receiver that fires on every detected change;
    /// the receiver closes once the handle is dropped.
    pub fn spawn(path: impl AsRef<Path>) -> Result<(Self, mpsc::Receiver<()>)> {
        let path = path.as_ref().to_path_buf();
        let dir = path
            .parent()
            .filter(|d| d.is_dir())
            .ok_or_else(|| {
                MeterError::Config(format!("config directory for '{}' does not exist", path.display()))
            })?
            .to_path_buf();

        let (raw_tx, raw_rx) = mpsc::unbounded_channel::<notify::Result<Event>>();
        let mut inner = RecommendedWatcher::new(
            move |res| {
                let _ = raw_tx.send(res);
            },
            notify::Config::default(),
        )
        .map_err(|e| MeterError::Config(format!("cannot create filesystem watcher: {e}")))?;

        inner
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| MeterError::Config(format!("cannot watch '{}': {e}", dir.display())))?;

        info!("Watching config file: {}", path.display());

        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(forward_changes(path, raw_rx, tx));

        Ok((Self { _inner: inner }, rx))
    }
}

/// Debounce raw events for `path` into single notifications.  Ends when the
/// watcher (and with it `raw_rx`'s sender) is dropped.
async fn forward_changes(
    path: PathBuf,
    mut raw_rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
    tx: mpsc::Sender<()>,
) {
    while let Some(event) = raw_rx.recv().await {
        match event {
            Ok(e) if touches(&e, &path) => {
                // Swallow the rest of the burst before notifying.
                while let Ok(Some(_)) = tokio::time::timeout(SETTLE, raw_rx.recv()).await {}
                debug!("config change detected");
                if tx.send(()).await.is_err() {
                    break; // receiver dropped
                }
            }
            Ok(_) => {}
            Err(e) => warn!("Watcher error: {e}"),
        }
    }
}

/// Whether `event` modifies or (re)creates the watched file.
fn touches(event: &Event, path: &Path) -> bool {
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
        && event.paths.iter().any(|p| p.file_name() == path.file_name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind, RemoveKind};

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn modify_of_watched_file_counts() {
        let target = Path::new("/cfg/cfm/cfm.toml");
        assert!(touches(&event(EventKind::Modify(ModifyKind::Any), "/cfg/cfm/cfm.toml"), target));
        assert!(touches(&event(EventKind::Create(CreateKind::File), "/cfg/cfm/cfm.toml"), target));
    }

    #[test]
    fn missing_directory_is_a_config_error() {
        let err = ConfigWatcher::spawn("/nonexistent/cfm/cfm.toml").err().unwrap();
        assert!(matches!(err, MeterError::Config(_)));
    }

    #[tokio::test]
    async fn dropping_the_handle_closes_the_receiver() {
        let dir = std::env::temp_dir();
        let (watcher, mut rx) = ConfigWatcher::spawn(dir.join("cfm-watcher-test.toml")).unwrap();
        drop(watcher);
        let closed = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await;
        assert_eq!(closed, Ok(None));
    }

    #[test]
    fn other_files_and_removals_are_ignored() {
        let target = Path::new("/cfg/cfm/cfm.toml");
        assert!(!touches(&event(EventKind::Modify(ModifyKind::Any), "/cfg/cfm/other.toml"), target));
        assert!(!touches(&event(EventKind::Remove(RemoveKind::File), "/cfg/cfm/cfm.toml"), target));
    }
}
