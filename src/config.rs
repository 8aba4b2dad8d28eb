/// Application configuration
///
/// Read from `<config dir>/civic-issues/config.json`. Every field has a
/// default, so a missing file or a partial file is fine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::error::Result;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Catalog location; the user data directory when unset
    pub database_path: Option<PathBuf>,
    /// How often the board re-renders so "time ago" labels stay current
    pub refresh_interval_secs: u64,
    /// Photos larger than this on either side are downscaled after decoding
    pub photo_max_dimension: u32,
    /// Timeout for fetching remote photos
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: None,
            refresh_interval_secs: 60,
            photo_max_dimension: 640,
            request_timeout_secs: 15,
        }
    }
}

impl Config {
    /// Default config path, if the platform has a config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("civic-issues").join("config.json"))
    }

    /// Load from the default path, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match Self::from_file(&path) {
            Ok(config) => {
                info!("⚙️  Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                error!("Ignoring config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
