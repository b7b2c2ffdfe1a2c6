//! The user's TOML settings file and the per-user directories derived from it.

use crate::{
    AppError, AppResult,
    config::{AudioConfig, BehaviourConfig, HotkeysConfig, ServerConfig},
};

use std::{
    fs,
    io::Write,
    panic::Location,
    path::{Path, PathBuf},
};

use dictaphone_core::SessionSettings;
use directories::ProjectDirs;
use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Main configuration struct.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Transcription backend configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Audio device configuration.
    #[serde(default)]
    pub audio: AudioConfig,
    /// Global hotkey bindings.
    #[serde(default)]
    pub hotkeys: HotkeysConfig,
    /// Application behavior settings.
    #[serde(default)]
    pub behavior: BehaviourConfig,
}

impl Config {
    /// Load configuration from the platform config directory, creating a
    /// default file if none exists.
    ///
    /// The endpoint is NOT validated here; a blank endpoint surfaces when a
    /// session starts, so the app can launch and let the user fix the file.
    #[track_caller]
    #[instrument]
    pub fn load() -> AppResult<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from `path`, writing defaults there if missing.
    #[track_caller]
    #[instrument]
    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            info!(config_path = ?path, "No config found, creating default");
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(path).map_err(|e| AppError::ConfigFile {
            path: path.to_path_buf(),
            reason: format!("unreadable: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| AppError::ConfigFile {
            path: path.to_path_buf(),
            reason: format!("not valid TOML: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(config_path = ?path, "Configuration loaded");

        Ok(config)
    }

    /// Save configuration to `path` via a synced temp file and rename.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
            debug!(config_dir = ?parent, "Created config directory");
        }

        let contents = toml::to_string_pretty(self).map_err(|e| AppError::ConfigFile {
            path: path.to_path_buf(),
            reason: format!("cannot serialize: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        // Readers only ever see the old file or the complete new one.
        let temp_path = path.with_extension("toml.tmp");

        write_synced(&temp_path, &contents).map_err(|e| AppError::ConfigFile {
            path: temp_path.clone(),
            reason: format!("cannot write: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        fs::rename(&temp_path, path).map_err(|e| AppError::ConfigFile {
            path: path.to_path_buf(),
            reason: format!("cannot replace with {:?}: {}", temp_path, e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(config_path = ?path, "Configuration saved");

        Ok(())
    }

    /// The settings a new session reads at connect time.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            endpoint_url: Some(self.server.endpoint_url.clone()),
            selected_device: self.audio.selected_device.clone(),
        }
    }

    /// Path of the TOML config file.
    #[track_caller]
    pub fn config_path() -> AppResult<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Path of the transcript history log.
    #[track_caller]
    pub fn history_path() -> AppResult<PathBuf> {
        Ok(Self::project_dirs()?.data_dir().join("history.jsonl"))
    }

    /// Directory for rolling log files.
    #[track_caller]
    pub fn log_dir() -> AppResult<PathBuf> {
        Ok(Self::project_dirs()?.data_dir().join("logs"))
    }

    #[track_caller]
    fn project_dirs() -> AppResult<ProjectDirs> {
        ProjectDirs::from("com", "dictaphone", "Dictaphone").ok_or_else(|| {
            AppError::NoUserDirectories {
                location: ErrorLocation::from(Location::caller()),
            }
        })
    }
}

fn write_synced(path: &Path, contents: &str) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()
}
