// User settings
// Loaded from ~/.config/staffgrid/settings.json

use serde::{Deserialize, Serialize};
use staffgrid_engine::LoaderConfig;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Grid
    #[serde(rename = "grid.hoursCap")]
    pub hours_cap: f64,

    #[serde(rename = "grid.defaultWeeks")]
    pub default_weeks: u32,

    // Snapshot loading
    #[serde(rename = "loader.asyncWeekThreshold")]
    pub async_week_threshold: u32,

    #[serde(rename = "loader.asyncPeopleThreshold")]
    pub async_people_threshold: u64,

    #[serde(rename = "loader.pollIntervalMs")]
    pub poll_interval_ms: u64,

    #[serde(rename = "loader.pollTimeoutSecs")]
    pub poll_timeout_secs: u64,

    // Backend
    #[serde(rename = "api.base")]
    pub api_base: String,

    #[serde(rename = "api.timeoutSecs")]
    pub api_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hours_cap: 168.0,
            default_weeks: 12,
            async_week_threshold: 20,
            async_people_threshold: 400,
            poll_interval_ms: 1500,
            poll_timeout_secs: 300,
            api_base: "http://localhost:8000".to_string(),
            api_timeout_secs: 60,
        }
    }
}

const DEFAULT_FILE: &str = r#"{
    // Grid
    // Upper bound for hours in one cell (a week has 168)
    "grid.hoursCap": 168,
    "grid.defaultWeeks": 12,

    // Snapshot loading
    // Horizons or scopes above these go through a background job
    "loader.asyncWeekThreshold": 20,
    "loader.asyncPeopleThreshold": 400,
    "loader.pollIntervalMs": 1500,
    "loader.pollTimeoutSecs": 300,

    // Backend
    "api.base": "http://localhost:8000",
    "api.timeoutSecs": 60
}
"#;

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("staffgrid")
            .join("settings.json")
    }

    /// Load settings from disk, falling back to defaults.
    /// Writes a commented default file on first run.
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            if let Err(e) = Self::write_default_file(&path) {
                log::warn!("Could not write default settings.json: {}", e);
            }
            return Self::default();
        }
        Self::load_from(&path)
    }

    /// Load from an explicit path. Missing or unparsable files give defaults.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents).unwrap_or_else(|e| {
                log::warn!("Error parsing {}: {} (using defaults)", path.display(), e);
                Self::default()
            }),
            Err(e) => {
                log::warn!("Error reading {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse settings JSON, ignoring whole-line `//` comments.
    pub fn parse(contents: &str) -> Result<Self, serde_json::Error> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");
        serde_json::from_str(&cleaned)
    }

    /// Save current settings to disk
    pub fn save(&self) -> Result<(), String> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;
        fs::write(path, json).map_err(|e| e.to_string())
    }

    fn write_default_file(path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, DEFAULT_FILE)
    }

    /// Loader tuning for the grid engine.
    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            async_week_threshold: self.async_week_threshold,
            async_people_threshold: self.async_people_threshold,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            poll_timeout: Duration::from_secs(self.poll_timeout_secs),
        }
    }

    /// Cap with nonsense values replaced by the default.
    pub fn effective_hours_cap(&self) -> f64 {
        if self.hours_cap.is_finite() && self.hours_cap > 0.0 {
            self.hours_cap
        } else {
            Self::default().hours_cap
        }
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs.max(1))
    }

    /// Get the config file path for display
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }
}
