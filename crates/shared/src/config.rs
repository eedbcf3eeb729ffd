//! Persisted application configuration.
//!
//! The config is a small JSON document in the per-user config directory.
//! Loading never fails from the caller's point of view: a missing or broken
//! file yields defaults. Every mutation is written back immediately.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_WINDOW_SIZE: [i32; 2] = [1200, 800];
pub const DEFAULT_WINDOW_POSITION: [i32; 2] = [100, 100];

/// Errors from reading or writing the config file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("No config directory available on this system")]
    NoConfigDir,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub first_run: bool,
    pub window_size: [i32; 2],
    pub window_position: [i32; 2],
    pub theme: String,
    pub language: String,
    /// Keys this build doesn't know about, kept so a save doesn't drop them.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            first_run: true,
            window_size: DEFAULT_WINDOW_SIZE,
            window_position: DEFAULT_WINDOW_POSITION,
            theme: "light".into(),
            language: "zh_CN".into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Saved window placement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowGeometry {
    pub size: [i32; 2],
    pub position: [i32; 2],
}

/// Resolve the per-user config file path, creating its directory.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let dir = if let Some(proj) = directories::ProjectDirs::from("com", "Zhenxun", "ZhenxunBotGui")
    {
        proj.config_dir().to_path_buf()
    } else if let Some(home) = dirs::home_dir() {
        home.join(".zhenxun_bot_gui")
    } else {
        return Err(ConfigError::NoConfigDir);
    };

    fs::create_dir_all(&dir).map_err(|source| ConfigError::Io {
        path: dir.clone(),
        source,
    })?;
    Ok(dir.join("config.json"))
}

/// Read a config file strictly. Missing keys are filled from defaults.
pub fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let bytes = fs::read(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_slice(&bytes)?)
}

pub fn write_config(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    let json = serde_json::to_vec_pretty(config)?;
    fs::write(path, json).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Owns the in-memory config and its backing file.
///
/// Only the UI thread holds one of these.
#[derive(Debug)]
pub struct ConfigStore {
    path: Option<PathBuf>,
    config: AppConfig,
}

impl ConfigStore {
    /// Open the config at the default per-user location.
    pub fn open_default() -> Self {
        match default_config_path() {
            Ok(path) => Self::open(path),
            Err(e) => {
                warn!("Config will not be persisted: {}", e);
                Self {
                    path: None,
                    config: AppConfig::default(),
                }
            }
        }
    }

    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let config = if path.exists() {
            match read_config(&path) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Falling back to default config: {}", e);
                    AppConfig::default()
                }
            }
        } else {
            debug!("No config at {}, using defaults", path.display());
            AppConfig::default()
        };

        Self {
            path: Some(path),
            config,
        }
    }

    pub fn get(&self) -> &AppConfig {
        &self.config
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_first_run(&self) -> bool {
        self.config.first_run
    }

    pub fn set_first_run_completed(&mut self) {
        self.update(|c| c.first_run = false);
    }

    pub fn window_geometry(&self) -> WindowGeometry {
        WindowGeometry {
            size: self.config.window_size,
            position: self.config.window_position,
        }
    }

    pub fn save_window_geometry(&mut self, geometry: WindowGeometry) {
        self.update(|c| {
            c.window_size = geometry.size;
            c.window_position = geometry.position;
        });
    }

    pub fn set_theme(&mut self, theme: impl Into<String>) {
        let theme = theme.into();
        self.update(|c| c.theme = theme);
    }

    pub fn set_language(&mut self, language: impl Into<String>) {
        let language = language.into();
        self.update(|c| c.language = language);
    }

    /// Apply a mutation and persist it. A failed save keeps the in-memory value.
    pub fn update(&mut self, f: impl FnOnce(&mut AppConfig)) {
        f(&mut self.config);
        if let Err(e) = self.save() {
            warn!("Failed to save config: {}", e);
        }
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        match &self.path {
            Some(path) => write_config(path, &self.config),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::open(dir.path().join("config.json"));
        assert_eq!(store.get(), &AppConfig::default());
        assert!(store.is_first_run());
    }

    #[test]
    fn test_partial_file_fills_missing_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"theme": "dark"}"#).unwrap();

        let store = ConfigStore::open(&path);
        assert_eq!(store.get().theme, "dark");
        assert_eq!(store.get().window_size, DEFAULT_WINDOW_SIZE);
        assert_eq!(store.get().language, "zh_CN");
        assert!(store.get().first_run);
    }

    #[test]
    fn test_malformed_json_falls_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let store = ConfigStore::open(&path);
        assert_eq!(store.get(), &AppConfig::default());
    }

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let mut store = ConfigStore::open(&path);
        store.set_first_run_completed();
        store.save_window_geometry(WindowGeometry {
            size: [1280, 720],
            position: [50, 60],
        });

        let reloaded = ConfigStore::open(&path);
        assert!(!reloaded.is_first_run());
        assert_eq!(
            reloaded.window_geometry(),
            WindowGeometry {
                size: [1280, 720],
                position: [50, 60],
            }
        );
    }

    #[test]
    fn test_unknown_keys_survive_save() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"first_run": false, "plugin_dir": "/opt/bot"}"#).unwrap();

        let mut store = ConfigStore::open(&path);
        store.set_theme("dark");

        let raw: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["plugin_dir"], "/opt/bot");
        assert_eq!(raw["theme"], "dark");
        assert_eq!(raw["first_run"], false);
    }

    #[test]
    fn test_save_failure_keeps_memory_value() {
        let dir = TempDir::new().unwrap();
        // Parent directory does not exist, so writes fail.
        let path = dir.path().join("missing").join("config.json");

        let mut store = ConfigStore::open(&path);
        store.set_language("en_US");
        assert_eq!(store.get().language, "en_US");
        assert!(!path.exists());
    }
}
