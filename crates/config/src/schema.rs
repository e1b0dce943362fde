use cfm_core::{MeterError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure parsed from `cfm.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeterConfig {
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Where the sensor's byte stream comes from.
    pub source: SourceConfig,
    /// Retry policy for dropped connections.
    pub reconnect: ReconnectConfig,
    /// Wire-level limits.
    pub protocol: ProtocolConfig,
    /// Statistics window settings.
    pub stats: StatsConfig,
    /// Output settings.
    pub display: DisplayConfig,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            source:    SourceConfig::default(),
            reconnect: ReconnectConfig::default(),
            protocol:  ProtocolConfig::default(),
            stats:     StatsConfig::default(),
            display:   DisplayConfig::default(),
        }
    }
}

impl MeterConfig {
    /// Reject values that would make the meter unusable.
    pub fn validate(&self) -> Result<()> {
        if self.stats.capacity == 0 {
            return Err(MeterError::Config("stats.capacity must be at least 1".into()));
        }
        if self.protocol.max_line_len == 0 {
            return Err(MeterError::Config("protocol.max_line_len must be at least 1".into()));
        }
        if self.protocol.read_buffer == 0 {
            return Err(MeterError::Config("protocol.read_buffer must be at least 1".into()));
        }
        if let SourceConfig::Tcp { address } = &self.source {
            if address.trim().is_empty() {
                return Err(MeterError::Config("source.address must not be empty".into()));
            }
        }
        Ok(())
    }
}

/// Byte-stream transport carrying `FR:` lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    /// TCP peer, e.g. a BLE-to-TCP bridge.
    Tcp { address: String },
    /// Character device, e.g. a bound RFCOMM port `/dev/rfcomm0`.  A regular
    /// file is read to its end once and never reopened.
    Serial { path: PathBuf },
    /// Unix domain socket.
    Unix { path: PathBuf },
    /// Standard input.
    Stdin,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::Serial { path: PathBuf::from("/dev/rfcomm0") }
    }
}

impl std::fmt::Display for SourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tcp { address } => write!(f, "tcp://{address}"),
            Self::Serial { path } => write!(f, "serial:{}", path.display()),
            Self::Unix { path }   => write!(f, "unix:{}", path.display()),
            Self::Stdin           => f.write_str("stdin"),
        }
    }
}

/// Reconnect behaviour after a session ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    /// Retry after a dropped or failed connection.  Ignored for stdin.
    pub enabled: bool,
    /// Delay between attempts, in milliseconds.
    pub delay_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled:  true,
            delay_ms: 2_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Lines longer than this (bytes, delimiter excluded) are dropped.
    pub max_line_len: usize,
    /// Size of each transport read, in bytes.
    pub read_buffer: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            max_line_len: 256,
            read_buffer:  64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Number of samples in the rolling window.
    pub capacity: usize,
    /// Clear statistics whenever a new session starts.
    pub reset_on_reconnect: bool,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            capacity:           50,
            reset_on_reconnect: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Human-readable line or one JSON object per sample.
    pub mode: DisplayMode,
    /// Decimal places in text mode.
    pub precision: usize,
    /// Append a sparkline of the window in text mode.
    pub sparkline: bool,
    /// Most recent samples shown in the sparkline.
    pub sparkline_width: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            mode:            DisplayMode::Text,
            precision:       1,
            sparkline:       true,
            sparkline_width: 24,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Text,
    Json,
}
