mod config;
mod settings;

pub use config::{Config, LogConfig, TimerConfig};
pub use settings::{keys, MemorySettings, SettingsStore, TomlSettings};

use std::path::PathBuf;

use crate::error::SettingsError;

/// Returns `~/.config/pomolog[-dev]/` based on POMOLOG_ENV.
///
/// Set POMOLOG_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, SettingsError> {
    let base_dir = dirs::home_dir()
        .ok_or(SettingsError::NoDataDir)?
        .join(".config");

    let env = std::env::var("POMOLOG_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("pomolog-dev")
    } else {
        base_dir.join("pomolog")
    };

    std::fs::create_dir_all(&dir).map_err(|e| SettingsError::SaveFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}

/// Default place for session logs: `~/pomodoro`.
pub fn default_log_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pomodoro")
}
