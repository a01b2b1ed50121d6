use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use vigil_types::MissionSort;

const APP_NAME: &str = "vigil";
const MIN_POLL_INTERVAL_MS: u64 = 100;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(#[source] confy::ConfyError),
    #[error("failed to save config: {0}")]
    Save(#[source] confy::ConfyError),
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub journal_directory: PathBuf,
    pub poll_interval_ms: u64,
    pub mission_sort: MissionSort,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            journal_directory: default_journal_directory(),
            poll_interval_ms: 1000,
            mission_sort: MissionSort::default(),
        }
    }
}

/// Where the game writes journals on a default install.
pub fn default_journal_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join("Saved Games")
        .join("Frontier Developments")
        .join("Elite Dangerous")
}

impl AppConfig {
    pub fn try_load() -> Result<Self, ConfigError> {
        confy::load(APP_NAME, None).map_err(ConfigError::Load)
    }

    /// Load the stored config, falling back to defaults if it is missing
    /// fields or unreadable.
    pub fn load() -> Self {
        match Self::try_load() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "[SESSION] using default config");
                Self::default()
            }
        }
    }

    pub fn try_save(&self) -> Result<(), ConfigError> {
        confy::store(APP_NAME, None, self).map_err(ConfigError::Save)
    }

    pub fn save(&self) {
        if let Err(e) = self.try_save() {
            tracing::error!(error = %e, "[SESSION] failed to save config");
        }
    }

    /// Location of the stored config file, if the platform has one.
    pub fn stored_path() -> Option<PathBuf> {
        confy::get_configuration_file_path(APP_NAME, None).ok()
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Poll interval, never shorter than 100 ms.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS))
    }

    pub fn with_journal_directory(mut self, dir: impl AsRef<Path>) -> Self {
        self.journal_directory = dir.as_ref().to_path_buf();
        self
    }
}
