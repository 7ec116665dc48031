//! User settings stored as settings.json in the app data directory

use crate::dispatch::DEFAULT_THINK_DELAY;
use crate::ticker::DEFAULT_INTERVAL;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

const SETTINGS_FILE: &str = "settings.json";

/// Root directory for settings and logs.
pub fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Vurtix")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Window geometry
    pub window_w: f32,
    pub window_h: f32,

    // Learning ticker
    pub auto_learn: bool,
    pub learning_interval_secs: u64,
    pub status_refresh_secs: u64,

    // Generation
    pub deep_think_delay_ms: u64,
    pub typing_delay_ms: u64,

    // Web search
    pub search_prefix: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            window_w: 1200.0,
            window_h: 800.0,
            auto_learn: true,
            learning_interval_secs: DEFAULT_INTERVAL.as_secs(),
            status_refresh_secs: 5,
            deep_think_delay_ms: DEFAULT_THINK_DELAY.as_millis() as u64,
            typing_delay_ms: 30,
            search_prefix: "python programming".to_string(),
        }
    }
}

impl Settings {
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join(SETTINGS_FILE);
        match std::fs::read_to_string(&path) {
            Ok(s) => match serde_json::from_str(&s) {
                Ok(settings) => {
                    debug!(path = %path.display(), "Settings loaded");
                    settings
                }
                Err(e) => {
                    warn!(error = %e, "Failed to parse settings, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                debug!("No settings file found, using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self, data_dir: &Path) {
        let path = data_dir.join(SETTINGS_FILE);
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&path, json) {
                    warn!(error = %e, path = %path.display(), "Failed to save settings");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize settings"),
        }
    }

    /// Zero would spin the ticker, so it is raised to one second.
    pub fn learning_interval(&self) -> Duration {
        Duration::from_secs(self.learning_interval_secs.max(1))
    }

    pub fn status_refresh(&self) -> Duration {
        Duration::from_secs(self.status_refresh_secs.max(1))
    }

    pub fn deep_think_delay(&self) -> Duration {
        Duration::from_millis(self.deep_think_delay_ms)
    }

    pub fn typing_delay(&self) -> Duration {
        Duration::from_millis(self.typing_delay_ms)
    }
}
