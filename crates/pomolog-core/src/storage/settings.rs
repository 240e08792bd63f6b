//! Durable key-value settings.
//!
//! Settings are flat string and integer values addressed by dotted keys
//! (see [`keys`]). Defaults are applied by the reader, never stored.
//!
//! [`TomlSettings`] persists them to `<data_dir>/settings.toml`:
//!
//! ```toml
//! "log.format" = "markdown"
//! "timer.work_minutes" = 25
//! ```

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::SettingsError;

/// Keys read by [`super::Config`].
pub mod keys {
    pub const WORK_MINUTES: &str = "timer.work_minutes";
    pub const BREAK_MINUTES: &str = "timer.break_minutes";
    pub const LOG_PATH: &str = "log.path";
    pub const LOG_FORMAT: &str = "log.format";
}

pub trait SettingsStore: Send {
    fn get_string(&self, key: &str) -> Option<String>;

    fn set_string(&mut self, key: &str, value: &str) -> Result<(), SettingsError>;

    fn get_int(&self, key: &str) -> Option<i64>;

    fn set_int(&mut self, key: &str, value: i64) -> Result<(), SettingsError>;

    /// Drop a key so the reader falls back to its default.
    fn remove(&mut self, key: &str) -> Result<(), SettingsError>;
}

/// In-memory store, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    strings: HashMap<String, String>,
    ints: HashMap<String, i64>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn get_string(&self, key: &str) -> Option<String> {
        self.strings.get(key).cloned()
    }

    fn set_string(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.ints.remove(key);
        self.strings.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get_int(&self, key: &str) -> Option<i64> {
        self.ints.get(key).copied()
    }

    fn set_int(&mut self, key: &str, value: i64) -> Result<(), SettingsError> {
        self.strings.remove(key);
        self.ints.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), SettingsError> {
        self.strings.remove(key);
        self.ints.remove(key);
        Ok(())
    }
}

/// TOML file-backed store. Every write rewrites the file atomically.
#[derive(Debug, Clone)]
pub struct TomlSettings {
    path: PathBuf,
    table: toml::Table,
}

impl TomlSettings {
    /// Open `~/.config/pomolog/settings.toml`.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable or the file
    /// exists but cannot be parsed.
    pub fn open_default() -> Result<Self, SettingsError> {
        Self::open(data_dir()?.join("settings.toml"))
    }

    /// Load from `path`; a missing file is an empty store.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let table = match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| SettingsError::LoadFailed {
                path: path.clone(),
                message: e.to_string(),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => toml::Table::new(),
            Err(e) => {
                return Err(SettingsError::LoadFailed {
                    path,
                    message: e.to_string(),
                })
            }
        };
        Ok(Self { path, table })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), SettingsError> {
        let save_err = |message: String| SettingsError::SaveFailed {
            path: self.path.clone(),
            message,
        };
        let content = toml::to_string_pretty(&self.table).map_err(|e| save_err(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_err(e.to_string()))?;
        }
        let tmp_path = self.path.with_extension("toml.tmp");
        let mut file = std::fs::File::create(&tmp_path).map_err(|e| save_err(e.to_string()))?;
        file.write_all(content.as_bytes())
            .map_err(|e| save_err(e.to_string()))?;
        file.sync_all().map_err(|e| save_err(e.to_string()))?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| save_err(e.to_string()))
    }
}

impl SettingsStore for TomlSettings {
    fn get_string(&self, key: &str) -> Option<String> {
        self.table
            .get(key)
            .and_then(toml::Value::as_str)
            .map(str::to_string)
    }

    fn set_string(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.table
            .insert(key.to_string(), toml::Value::String(value.to_string()));
        self.save()
    }

    fn get_int(&self, key: &str) -> Option<i64> {
        self.table.get(key).and_then(toml::Value::as_integer)
    }

    fn set_int(&mut self, key: &str, value: i64) -> Result<(), SettingsError> {
        self.table
            .insert(key.to_string(), toml::Value::Integer(value));
        self.save()
    }

    fn remove(&mut self, key: &str) -> Result<(), SettingsError> {
        if self.table.remove(key).is_some() {
            self.save()?;
        }
        Ok(())
    }
}
