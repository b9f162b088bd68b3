use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

const APP_DIR: &str = "conda-migrate";

/// Get the home directory
pub fn home_dir() -> Result<PathBuf> {
    directories::BaseDirs::new()
        .context("Failed to get home directory")
        .map(|bd| bd.home_dir().to_path_buf())
}

/// Get the XDG config directory for conda-migrate
///
/// Returns `$XDG_CONFIG_HOME/conda-migrate` or `~/.config/conda-migrate` if not set
pub fn config_dir() -> Result<PathBuf> {
    let base = match env::var_os("XDG_CONFIG_HOME").filter(|value| !value.is_empty()) {
        Some(value) => PathBuf::from(value),
        None => home_dir()?.join(".config"),
    };

    Ok(base.join(APP_DIR))
}

/// Get the XDG state directory for conda-migrate
///
/// Returns `$XDG_STATE_HOME/conda-migrate` or `~/.local/state/conda-migrate` if not set
pub fn state_dir() -> Result<PathBuf> {
    let base = match env::var_os("XDG_STATE_HOME").filter(|value| !value.is_empty()) {
        Some(value) => PathBuf::from(value),
        None => home_dir()?.join(".local/state"),
    };

    Ok(base.join(APP_DIR))
}
