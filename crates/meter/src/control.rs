use cfm_core::Message;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Map one line typed on the terminal to a meter command.
pub fn parse_command(line: &str) -> Option<Message> {
    match line.trim().to_ascii_lowercase().as_str() {
        "r" | "reset"          => Some(Message::ResetRequested),
        "q" | "quit" | "exit"  => Some(Message::Shutdown),
        _                      => None,
    }
}

/// Read commands from stdin and forward them.  Only used when the sensor
/// stream is not itself coming from stdin.
pub fn spawn_commands(tx: mpsc::Sender<Message>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        info!("Type 'r' + Enter to reset statistics, 'q' + Enter to quit");

        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }
            match parse_command(&line) {
                Some(msg) => {
                    if tx.send(msg).await.is_err() {
                        return;
                    }
                }
                None => warn!("Unknown command {line:?} (expected 'r' or 'q')"),
            }
        }
    });
}

/// Turn Ctrl-C into a graceful `Shutdown`.
pub fn spawn_ctrl_c(tx: mpsc::Sender<Message>) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = tx.send(Message::Shutdown).await;
            }
            Err(e) => warn!("Cannot listen for Ctrl-C: {e}"),
        }
    });
}
