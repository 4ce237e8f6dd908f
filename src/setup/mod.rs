//! Setup module for initial application configuration.
//!
//! Handles first-run setup by writing the default config file when none exists.

use anyhow::anyhow;
use std::path::Path;

/// Embedded default configuration template.
pub(crate) const DEFAULT_CONFIG: &str = include_str!("../../environments/liveq.toml");

/// Runs the setup process if the main config file is missing.
///
/// # Errors
/// Returns an error if the config directory or file cannot be written.
pub fn run_setup_if_needed() -> anyhow::Result<()> {
    let config_path = crate::config::get_config_path()?;
    if config_path.exists() {
        tracing::debug!("Config file present: {}", config_path.display());
        return Ok(());
    }

    write_default_config(&config_path).map_err(|e| {
        tracing::error!("Setup failed: {e}");
        anyhow!("Setup failed: {e}")
    })?;
    tracing::info!("Wrote default configuration to {}", config_path.display());
    Ok(())
}

/// Writes the embedded template to `path`, creating parent directories.
///
/// # Errors
/// Returns an error if any file operations fail.
fn write_default_config(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, DEFAULT_CONFIG)?;
    Ok(())
}
