// Application settings
// Loaded from ~/.config/colcheck/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Host
    #[serde(rename = "host.url")]
    pub host_url: String,

    #[serde(rename = "host.project")]
    pub host_project: Option<String>,

    #[serde(rename = "host.timeoutSecs")]
    pub timeout_secs: u64,

    #[serde(rename = "host.retries")]
    pub retries: u32,

    // Correction session
    #[serde(rename = "session.displayLimit")]
    pub display_limit: usize,

    #[serde(rename = "session.correctionLimit")]
    pub correction_limit: usize,

    // Logging
    #[serde(rename = "log.level")]
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            // Host
            host_url: "http://127.0.0.1:3333".to_string(),
            host_project: None,
            timeout_secs: 30,
            retries: 3,
            // Session
            display_limit: 10,
            correction_limit: 15,
            // Logging
            log_level: "warn".to_string(),
        }
    }
}

const DEFAULT_FILE: &str = r#"{
    // OpenRefine-compatible server used by `colcheck verify --project`
    "host.url": "http://127.0.0.1:3333",
    "host.project": null,
    "host.timeoutSecs": 30,
    "host.retries": 3,

    // Correction session
    // displayLimit: flagged values listed per inspection
    // correctionLimit: above this many unexpected values the column is
    // framed as probably the wrong one
    "session.displayLimit": 10,
    "session.correctionLimit": 15,

    // error, warn, info, debug or trace (RUST_LOG wins when set)
    "log.level": "warn"
}
"#;

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("colcheck");
        config_dir.join("settings.json")
    }

    /// Load settings from disk, falling back to defaults
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load settings from `path`. A missing file gives the defaults; so does
    /// one that cannot be read or parsed, with a warning.
    pub fn load_from(path: &Path) -> Self {
        Self::read(path).unwrap_or_else(|e| {
            log::warn!("{}; using default settings", e);
            Self::default()
        })
    }

    /// Like `load_from`, but a file that cannot be read or parsed is an error.
    pub fn read(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            log::debug!("{} not found, using default settings", path.display());
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("error reading {}: {}", path.display(), e))?;
        Self::parse(&contents).map_err(|e| format!("error parsing {}: {}", path.display(), e))
    }

    /// Parse settings JSON. Lines starting with `//` are comments.
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
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;

        fs::write(path, json).map_err(|e| e.to_string())
    }

    /// Write the commented default file to `path` unless one exists.
    pub fn create_default_file(path: &Path) -> Result<bool, String> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        fs::write(path, DEFAULT_FILE).map_err(|e| e.to_string())?;
        Ok(true)
    }
}
