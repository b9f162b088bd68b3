use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::util::{self, xdg};

const CONFIG_FILE: &str = "config.toml";
const DEFAULT_CHANNEL: &str = "conda-forge";
const DEFAULT_EXPORT_DIR: &str = "conda-exports";

/// Optional defaults read from `$XDG_CONFIG_HOME/conda-migrate/config.toml`.
///
/// Command-line flags and environment variables take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub export_dir: Option<String>,
    pub channel: Option<String>,
    pub miniforge_prefix: Option<String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        toml::from_str(&contents).with_context(|| format!("Failed to parse config file {:?}", path))
    }

    pub fn load_default() -> Result<Self> {
        Self::load(&xdg::config_dir()?.join(CONFIG_FILE))
    }
}

/// Effective settings after applying flag > env > config file > default.
#[derive(Debug, Clone)]
pub struct Settings {
    pub home: PathBuf,
    pub export_dir: PathBuf,
    pub state_dir: PathBuf,
    pub channel: String,
    pub miniforge_prefix: Option<PathBuf>,
}

impl Settings {
    pub fn resolve(config: &Config, export_dir: Option<PathBuf>) -> Result<Self> {
        let home = xdg::home_dir()?;
        let export_dir = match export_dir {
            Some(dir) => dir,
            None => match &config.export_dir {
                Some(raw) => expand(raw, "export_dir")?,
                None => home.join(DEFAULT_EXPORT_DIR),
            },
        };
        let miniforge_prefix = config
            .miniforge_prefix
            .as_deref()
            .map(|raw| expand(raw, "miniforge_prefix"))
            .transpose()?;

        Ok(Self {
            home,
            export_dir,
            state_dir: xdg::state_dir()?,
            channel: config
                .channel
                .clone()
                .unwrap_or_else(|| DEFAULT_CHANNEL.to_string()),
            miniforge_prefix,
        })
    }

    pub fn log_dir(&self) -> PathBuf {
        self.state_dir.join("logs")
    }
}

fn expand(raw: &str, key: &str) -> Result<PathBuf> {
    util::expand_path(raw).map_err(|err| anyhow::anyhow!("Invalid `{key}` in {CONFIG_FILE}: {err}"))
}
