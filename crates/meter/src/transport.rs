use cfm_config::{ReconnectConfig, SourceConfig};
use cfm_core::{Message, MeterError, Result, SessionEndReason};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

type Reader = Box<dyn AsyncRead + Unpin + Send>;

/// Spawn a background task that connects to `source` and streams its bytes
/// as `SessionStarted` / `Chunk` / `SessionEnded` messages.
///
/// Each connection is one session: chunks are sent in read order and the
/// session's `SessionEnded` is always its last message.  With reconnect
/// enabled the task retries forever, except after reading a regular file
/// to its end (reopening it would replay the same samples).  It stops as
/// soon as the receiver is dropped.
pub fn spawn(
    source:      SourceConfig,
    reconnect:   ReconnectConfig,
    read_buffer: usize,
    tx:          mpsc::Sender<Message>,
) -> JoinHandle<()> {
    let delay = Duration::from_millis(reconnect.delay_ms);
    let retry = reconnect.enabled && source != SourceConfig::Stdin;

    tokio::spawn(async move {
        loop {
            match open(&source).await {
                Ok(Opened { reader, finite }) => {
                    info!("Connected to {source}");
                    if tx.send(Message::SessionStarted(source.to_string())).await.is_err() {
                        return;
                    }

                    let Some(reason) = pump(reader, read_buffer, &tx).await else {
                        return; // receiver dropped
                    };

                    warn!("{source} session ended: {reason}");
                    if tx.send(Message::SessionEnded(reason)).await.is_err() {
                        return;
                    }
                    if finite {
                        info!("Reached end of {source}; transport stopped");
                        return;
                    }
                }
                Err(e) => error!("Cannot open {source}: {e}"),
            }

            if !retry {
                info!("Reconnect disabled; transport stopped");
                return;
            }
            info!("Reconnecting in {}ms…", delay.as_millis());
            tokio::time::sleep(delay).await;
        }
    })
}

struct Opened {
    reader: Reader,
    /// The stream has a fixed end (a regular file), so there is nothing to
    /// reconnect to once it is consumed.
    finite: bool,
}

async fn open(source: &SourceConfig) -> Result<Opened> {
    let mut finite = false;
    let reader: Reader = match source {
        SourceConfig::Tcp { address } => Box::new(
            tokio::net::TcpStream::connect(address)
                .await
                .map_err(|e| MeterError::Transport(format!("connect {address}: {e}")))?,
        ),
        SourceConfig::Serial { path } => {
            let file = tokio::fs::File::open(path).await?;
            finite = file.metadata().await?.file_type().is_file();
            Box::new(file)
        }
        #[cfg(unix)]
        SourceConfig::Unix { path } => Box::new(
            tokio::net::UnixStream::connect(path)
                .await
                .map_err(|e| MeterError::Transport(format!("connect {}: {e}", path.display())))?,
        ),
        #[cfg(not(unix))]
        SourceConfig::Unix { .. } => {
            return Err(MeterError::Transport("unix sockets are not supported on this platform".into()))
        }
        SourceConfig::Stdin => Box::new(tokio::io::stdin()),
    };
    Ok(Opened { reader, finite })
}

/// Forward everything `reader` yields as `Chunk` messages until it ends.
///
/// Returns why the stream ended, or `None` if the receiver went away first.
pub async fn pump<R>(
    mut reader: R,
    read_buffer: usize,
    tx: &mpsc::Sender<Message>,
) -> Option<SessionEndReason>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; read_buffer.max(1)];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => return Some(SessionEndReason::Closed),
            Ok(n) => {
                if tx.send(Message::Chunk(buf[..n].to_vec())).await.is_err() {
                    return None;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Some(SessionEndReason::Failed(e.to_string())),
        }
    }
}
