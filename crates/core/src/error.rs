use thiserror::Error;

/// Top-level error type used across the entire application.
///
/// Sensor-data noise never shows up here; bad lines are absorbed by the
/// protocol layer. These variants cover misuse and the I/O around the core.
#[derive(Debug, Error)]
pub enum MeterError {
    #[error("config error: {0}")]
    Config(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("session already ended; start a new session before feeding data")]
    SessionClosed,

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

pub type Result<T, E = MeterError> = std::result::Result<T, E>;
