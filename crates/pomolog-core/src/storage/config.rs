//! Application configuration.
//!
//! An explicit value built from a [`SettingsStore`] at startup and passed to
//! the controller. It is re-read only when the caller reconfigures.
//!
//! - Work and break lengths in minutes (default 25 / 5)
//! - Session log format and location (default Markdown journal in `~/pomodoro`)

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::default_log_dir;
use super::settings::{keys, SettingsStore};
use crate::error::SettingsError;
use crate::session::{open_log, LogFormat, SessionLog};
use crate::timer::Durations;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,
    #[serde(default = "default_break_minutes")]
    pub break_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// File for json/tsv, directory for markdown. `None` picks a default
    /// under `~/pomodoro`.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub log: LogConfig,
}

fn default_work_minutes() -> u32 {
    25
}
fn default_break_minutes() -> u32 {
    5
}
fn default_log_format() -> LogFormat {
    LogFormat::Markdown
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            break_minutes: default_break_minutes(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: None,
            format: default_log_format(),
        }
    }
}

impl LogConfig {
    pub fn resolved_path(&self) -> PathBuf {
        if let Some(path) = &self.path {
            return path.clone();
        }
        let dir = default_log_dir();
        match self.format {
            LogFormat::Markdown => dir,
            LogFormat::Json => dir.join("pomodoro.json"),
            LogFormat::Tsv => dir.join("pomodoro.tsv"),
        }
    }

    pub fn open(&self) -> Box<dyn SessionLog> {
        open_log(self.format, self.resolved_path())
    }
}

/// Read a positive minute count, falling back on absent or invalid values.
fn read_minutes(store: &dyn SettingsStore, key: &str, default: u32) -> u32 {
    match store.get_int(key) {
        None => default,
        Some(v) if v > 0 && v <= i64::from(u32::MAX) => v as u32,
        Some(v) => {
            tracing::warn!(key, value = v, "ignoring invalid minutes setting");
            default
        }
    }
}

impl Config {
    /// Build from the settings store, applying defaults for absent or invalid keys.
    pub fn load(store: &dyn SettingsStore) -> Self {
        let format = match store.get_string(keys::LOG_FORMAT) {
            None => default_log_format(),
            Some(raw) => raw.parse::<LogFormat>().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "ignoring invalid log format setting");
                default_log_format()
            }),
        };
        Self {
            timer: TimerConfig {
                work_minutes: read_minutes(store, keys::WORK_MINUTES, default_work_minutes()),
                break_minutes: read_minutes(store, keys::BREAK_MINUTES, default_break_minutes()),
            },
            log: LogConfig {
                path: store
                    .get_string(keys::LOG_PATH)
                    .filter(|p| !p.trim().is_empty())
                    .map(PathBuf::from),
                format,
            },
        }
    }

    /// Persist every key.
    ///
    /// # Errors
    /// Returns an error if the store rejects a write.
    pub fn save(&self, store: &mut dyn SettingsStore) -> Result<(), SettingsError> {
        store.set_int(keys::WORK_MINUTES, i64::from(self.timer.work_minutes))?;
        store.set_int(keys::BREAK_MINUTES, i64::from(self.timer.break_minutes))?;
        store.set_string(keys::LOG_FORMAT, self.log.format.as_str())?;
        match &self.log.path {
            Some(path) => store.set_string(keys::LOG_PATH, &path.to_string_lossy())?,
            None => store.remove(keys::LOG_PATH)?,
        }
        Ok(())
    }

    pub fn durations(&self) -> Durations {
        Durations::from_minutes(self.timer.work_minutes, self.timer.break_minutes)
    }

    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), SettingsError> {
        let unknown = || SettingsError::UnknownKey(key.to_string());
        let invalid = |message: String| SettingsError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let (parent, leaf) = match key.rsplit_once('.') {
            Some((parent, leaf)) => (
                Self::get_json_value_mut(root, parent).ok_or_else(unknown)?,
                leaf,
            ),
            None => (root, key),
        };
        let obj = parent.as_object_mut().ok_or_else(unknown)?;
        let existing = obj.get(leaf).ok_or_else(unknown)?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
            ),
            serde_json::Value::Number(_) => {
                let n = value
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                serde_json::Value::Number(n.into())
            }
            _ if value.trim().is_empty() => serde_json::Value::Null,
            _ => serde_json::Value::String(value.to_string()),
        };

        obj.insert(leaf.to_string(), new_value);
        Ok(())
    }

    fn get_json_value_mut<'a>(
        root: &'a mut serde_json::Value,
        key: &str,
    ) -> Option<&'a mut serde_json::Value> {
        let mut current = root;
        for part in key.split('.') {
            current = current.get_mut(part)?;
        }
        Some(current)
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => Some(String::new()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key, e.g. `timer.work_minutes`.
    /// An empty value for `log.path` restores the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value is invalid.
    /// `self` is unchanged on error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        let invalid = |message: String| SettingsError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        if updated.timer.work_minutes == 0 || updated.timer.break_minutes == 0 {
            return Err(invalid("minutes must be positive".to_string()));
        }
        *self = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemorySettings;

    #[test]
    fn defaults_when_store_is_empty() {
        let cfg = Config::load(&MemorySettings::new());
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.timer.work_minutes, 25);
        assert_eq!(cfg.timer.break_minutes, 5);
        assert_eq!(cfg.log.format, LogFormat::Markdown);
        assert_eq!(cfg.durations(), Durations::default());
        assert!(cfg.log.resolved_path().ends_with("pomodoro"));
    }

    #[test]
    fn save_then_load_round_trips() {
        let mut store = MemorySettings::new();
        let cfg = Config {
            timer: TimerConfig {
                work_minutes: 50,
                break_minutes: 10,
            },
            log: LogConfig {
                path: Some(PathBuf::from("/tmp/focus.tsv")),
                format: LogFormat::Tsv,
            },
        };
        cfg.save(&mut store).unwrap();
        assert_eq!(Config::load(&store), cfg);
    }

    #[test]
    fn invalid_store_values_fall_back() {
        let mut store = MemorySettings::new();
        store.set_int(keys::WORK_MINUTES, 0).unwrap();
        store.set_int(keys::BREAK_MINUTES, -3).unwrap();
        store.set_string(keys::LOG_FORMAT, "xml").unwrap();
        store.set_string(keys::LOG_PATH, "   ").unwrap();
        assert_eq!(Config::load(&store), Config::default());
    }

    #[test]
    fn default_paths_follow_format() {
        let mut log = LogConfig::default();
        log.format = LogFormat::Json;
        assert!(log.resolved_path().ends_with("pomodoro/pomodoro.json"));
        log.format = LogFormat::Tsv;
        assert!(log.resolved_path().ends_with("pomodoro/pomodoro.tsv"));
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("timer.work_minutes").as_deref(), Some("25"));
        assert_eq!(cfg.get("log.format").as_deref(), Some("markdown"));
        assert_eq!(cfg.get("log.path").as_deref(), Some(""));
        assert!(cfg.get("timer.missing").is_none());
    }

    #[test]
    fn set_updates_values() {
        let mut cfg = Config::default();
        cfg.set("timer.break_minutes", "15").unwrap();
        cfg.set("log.format", "json").unwrap();
        cfg.set("log.path", "/tmp/x.json").unwrap();
        assert_eq!(cfg.timer.break_minutes, 15);
        assert_eq!(cfg.log.format, LogFormat::Json);
        assert_eq!(cfg.log.path, Some(PathBuf::from("/tmp/x.json")));

        cfg.set("log.path", "").unwrap();
        assert_eq!(cfg.log.path, None);

        cfg.set("log.format", "md").unwrap();
        assert_eq!(cfg.log.format, LogFormat::Markdown);
    }

    #[test]
    fn set_rejects_bad_input_and_keeps_state() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("timer.nonexistent", "1"),
            Err(SettingsError::UnknownKey(_))
        ));
        assert!(cfg.set("timer.work_minutes", "soon").is_err());
        assert!(cfg.set("timer.work_minutes", "0").is_err());
        assert!(cfg.set("log.format", "xml").is_err());
        assert_eq!(cfg, Config::default());
    }
}
