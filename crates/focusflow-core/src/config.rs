use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Get the local data directory for focusflow.
///
/// # Errors
///
/// Returns an error if the local data directory cannot be determined.
pub fn get_data_dir() -> Result<PathBuf> {
    let mut path =
        dirs::data_local_dir().ok_or_else(|| anyhow::anyhow!("Failed to get local data dir"))?;
    path.push("focusflow");
    Ok(path)
}

/// Daemon configuration, read from `config.toml` in the data directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// How often the daemon polls for settings changes made by other processes
    pub tick_interval_ms: u64,
    /// Page that blocked navigations are redirected to
    pub blocked_page_url: String,
    /// Maximum number of installed dynamic rules
    pub rule_quota: usize,
    /// Show a notification when a session completes
    pub notifications: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            blocked_page_url: "focusflow://blocked".to_string(),
            rule_quota: 5000,
            notifications: true,
        }
    }
}

impl CoreConfig {
    /// Load `config.toml` from `data_dir`, falling back to defaults when absent
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed
    pub fn load(data_dir: &Path) -> Result<Self> {
        Self::load_from(&data_dir.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from an explicit path
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config at {}", path.display()))?;
        Ok(config)
    }

    /// Write this configuration to `data_dir`
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails
    pub fn save(&self, data_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(data_dir).context("Failed to create data directory")?;
        let path = data_dir.join(CONFIG_FILE_NAME);
        std::fs::write(&path, toml::to_string_pretty(self)?)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        Ok(path)
    }
}
