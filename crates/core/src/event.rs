/// All messages (events) that can flow through the meter event bus.
///
/// Sources:
/// - Transport task      → `SessionStarted`, `Chunk`, `SessionEnded`
/// - Control input task  → `ResetRequested`, `Shutdown`
/// - Config watcher task → `ConfigReloaded`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // ── Transport ─────────────────────────────────────────────────────────────
    /// A connection was established; carries a human-readable peer label.
    SessionStarted(String),
    /// Raw bytes as they arrived.  No alignment with line boundaries.
    Chunk(Vec<u8>),
    /// The connection terminated.  No `Chunk` follows until the next
    /// `SessionStarted`.
    SessionEnded(SessionEndReason),

    // ── Config ────────────────────────────────────────────────────────────────
    /// Config file changed on disk — triggers a live reload.
    ConfigReloaded,

    // ── User actions ──────────────────────────────────────────────────────────
    /// Clear the statistics window (the live reading is kept).
    ResetRequested,
    /// Graceful shutdown requested.
    Shutdown,
}

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEndReason {
    /// The peer closed the stream (EOF).
    Closed,
    /// A read failed; carries the error text.
    Failed(String),
}

impl std::fmt::Display for SessionEndReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed    => f.write_str("closed by peer"),
            Self::Failed(e) => write!(f, "read failed: {e}"),
        }
    }
}
