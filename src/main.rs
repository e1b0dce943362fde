//! cfm — live airflow readout for `FR:<value>` flow sensors.
//!
//! Run with:  `RUST_LOG=info cfm`
//! Config:    `$CFM_CONFIG`, else `~/.config/cfm/cfm.toml`

use anyhow::{Context, Result};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let path = cfm_config::default_path();
    let (config, origin) = cfm_config::load(&path)
        .with_context(|| format!("loading config from '{}'", path.display()))?;

    // Structured logging on stderr; stdout carries the readings.
    // RUST_LOG overrides the configured level.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    tracing::info!("cfm v{} starting", env!("CARGO_PKG_VERSION"));
    if origin == cfm_config::Origin::Defaults {
        tracing::warn!("Config file not found at '{}'; using defaults", path.display());
    }
    tracing::info!("Reading from {}", config.source);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;

    let result = runtime.block_on(cfm_meter::run(path, config));

    // A blocked stdin read would otherwise hold the runtime open.
    runtime.shutdown_timeout(Duration::from_millis(200));

    result.map_err(Into::into)
}
