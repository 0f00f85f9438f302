// src/config.rs

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::core::error::ConfigError;
use crate::logging::project_directory;

const SETTINGS_FILE: &str = "settings.json";

/// Scanner settings, persisted as JSON in the platform config directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Standard port every route is compared against.
    pub http_port: u16,
    /// Target port used when the request URL has neither an explicit port nor
    /// a scheme with a well-known one.
    pub https_port: u16,
    /// Highest TTL probed before giving up on reaching the target.
    pub max_ttl: u8,
    /// How long to wait for an answer to each hop.
    pub probe_timeout_ms: u64,
    /// Trace both ports at the same time instead of one after the other.
    pub concurrent_probes: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            http_port: 80,
            https_port: 443,
            max_ttl: 30,
            probe_timeout_ms: 1000,
            concurrent_probes: true,
        }
    }
}

impl Settings {
    /// Config file path, e.g. ~/.config/vanguard-route-divergence/settings.json
    pub fn path() -> Option<PathBuf> {
        project_directory().map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
    }

    /// Loads settings from the default location. A missing file is created
    /// with the defaults; an unreadable or invalid one yields the defaults.
    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            return Self::default();
        };
        if !path.exists() {
            let defaults = Self::default();
            if let Err(e) = defaults.save_to(&path) {
                warn!(path = %path.display(), error = %e, "Could not write default settings.");
            }
            return defaults;
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "No settings file, using defaults.");
                return Self::default();
            }
        };

        let settings: Settings = match serde_json::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Settings file is not valid JSON, using defaults.");
                return Self::default();
            }
        };

        match settings.validate() {
            Ok(()) => settings,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Settings rejected, using defaults.");
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http_port == 0 {
            return Err(ConfigError::InvalidValue { field: "http_port", value: "0".into() });
        }
        if self.https_port == 0 {
            return Err(ConfigError::InvalidValue { field: "https_port", value: "0".into() });
        }
        if self.max_ttl == 0 {
            return Err(ConfigError::InvalidValue { field: "max_ttl", value: "0".into() });
        }
        if self.probe_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue { field: "probe_timeout_ms", value: "0".into() });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        assert_eq!(settings.http_port, 80);
        assert_eq!(settings.https_port, 443);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("nope.json"));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, r#"{ "http_port": 8080, "max_ttl": 12 }"#).unwrap();

        let settings = Settings::load_from(&path);
        assert_eq!(settings.http_port, 8080);
        assert_eq!(settings.max_ttl, 12);
        assert_eq!(settings.https_port, 443);
    }

    #[test]
    fn invalid_values_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, r#"{ "max_ttl": 0 }"#).unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());

        fs::write(&path, "not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILE);
        let settings = Settings { https_port: 8443, concurrent_probes: false, ..Settings::default() };
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path), settings);
    }

    #[test]
    fn save_rejects_zero_port() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings { http_port: 0, ..Settings::default() };
        assert!(settings.save_to(&dir.path().join(SETTINGS_FILE)).is_err());
    }
}
