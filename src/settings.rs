use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AppError, Result};

pub const SETTINGS_FILE: &str = "settings.toml";

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub retrieval: RetrievalSettings,
    #[serde(default)]
    pub paths: PathSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetrievalSettings {
    /// How far back channel history is fetched, counted from process start.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: i64,
    /// Pause between page requests and before each thread expansion.
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
    #[serde(default = "default_page_limit")]
    pub page_limit: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PathSettings {
    #[serde(default = "default_channels_path")]
    pub channels: PathBuf,
    #[serde(default = "default_raw_dir")]
    pub raw_dir: PathBuf,
    #[serde(default = "default_emojis_path")]
    pub emojis: PathBuf,
}

fn default_lookback_days() -> i64 {
    30
}

fn default_throttle_ms() -> u64 {
    1000
}

fn default_page_limit() -> u16 {
    200
}

fn default_channels_path() -> PathBuf {
    PathBuf::from("channels.json")
}

fn default_raw_dir() -> PathBuf {
    PathBuf::from("raw")
}

fn default_emojis_path() -> PathBuf {
    PathBuf::from("emojis.json")
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            lookback_days: default_lookback_days(),
            throttle_ms: default_throttle_ms(),
            page_limit: default_page_limit(),
        }
    }
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            channels: default_channels_path(),
            raw_dir: default_raw_dir(),
            emojis: default_emojis_path(),
        }
    }
}

impl RetrievalSettings {
    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    /// Start of the retrieval window. Computed once per run.
    pub fn oldest(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - chrono::Duration::days(self.lookback_days)
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(SETTINGS_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| AppError::ReadFile {
            path: path.display().to_string(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| AppError::TomlParse(e.to_string()))
    }
}
