pub mod schema;
pub mod watcher;

pub use schema::{
    DisplayConfig, DisplayMode, MeterConfig, ProtocolConfig, ReconnectConfig, SourceConfig,
    StatsConfig,
};
pub use watcher::ConfigWatcher;

use cfm_core::{MeterError, Result};
use std::path::{Path, PathBuf};

/// Where a loaded configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Parsed from the file on disk.
    File,
    /// No file existed; `MeterConfig::default()` was used.
    Defaults,
}

/// Load and validate configuration from a TOML file.  A missing file is not
/// an error: `MeterConfig::default()` is returned with `Origin::Defaults` so
/// the caller can report it once logging is up.
pub fn load(path: impl AsRef<Path>) -> Result<(MeterConfig, Origin)> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok((MeterConfig::default(), Origin::Defaults));
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|e| MeterError::Config(format!("cannot read '{}': {e}", path.display())))?;

    Ok((parse(&raw)?, Origin::File))
}

/// Parse and validate configuration from TOML text.
pub fn parse(raw: &str) -> Result<MeterConfig> {
    let config: MeterConfig =
        toml::from_str(raw).map_err(|e| MeterError::Config(format!("TOML parse error: {e}")))?;
    config.validate()?;
    Ok(config)
}

/// Return the config path: `$CFM_CONFIG` if set, otherwise
/// `cfm/cfm.toml` under `$XDG_CONFIG_HOME`.
pub fn default_path() -> PathBuf {
    if let Ok(explicit) = std::env::var("CFM_CONFIG") {
        return PathBuf::from(explicit);
    }
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("cfm").join("cfm.toml")
}
