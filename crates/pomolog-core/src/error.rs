//! Core error types for pomolog-core.
//!
//! Errors are split by the component that raises them so callers can tell a
//! failed log write (recoverable, the timer keeps running) apart from a broken
//! settings file or a controller that has already shut down.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for pomolog-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Session log errors
    #[error("Session log error: {0}")]
    Log(#[from] LogError),

    /// Settings store errors
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// Controller errors
    #[error("Controller error: {0}")]
    Control(#[from] ControlError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Session log errors.
///
/// Reads of malformed existing content are never reported here; they degrade
/// to "no prior entries". Only failed writes surface.
#[derive(Error, Debug)]
pub enum LogError {
    /// Could not create the directory holding the log
    #[error("Failed to create log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not append to or rewrite the log file
    #[error("Failed to write log file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not encode the structured log
    #[error("Failed to serialize session log: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Settings store errors.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Failed to load settings
    #[error("Failed to load settings from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save settings
    #[error("Failed to save settings to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid settings value
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown settings key
    #[error("Unknown settings key: {0}")]
    UnknownKey(String),

    /// The home/config directory could not be determined
    #[error("Cannot determine data directory")]
    NoDataDir,
}

/// Controller errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// A work session needs a non-blank task description
    #[error("Task description is empty")]
    EmptyTask,

    /// The controller loop has stopped
    #[error("Controller is not running")]
    Closed,
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
