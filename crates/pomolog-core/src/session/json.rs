//! Structured session log: a single JSON array of [`SessionEntry`] records.
//!
//! JSON arrays cannot be appended to in place, so every call reads the whole
//! file, edits the last element (or pushes a new one) and rewrites the file
//! through a temp file + rename. Content that does not parse counts as "no
//! prior entries"; before it is overwritten it is copied to `<file>.bak`, and
//! if that copy fails the write is refused.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use super::{ensure_parent, LogFormat, LogWrite, Note, SessionEntry, SessionLog};
use crate::error::LogError;

#[derive(Debug)]
pub struct JsonLog {
    path: PathBuf,
}

/// What was found on disk.
enum Loaded {
    Missing,
    Entries(Vec<SessionEntry>),
    Malformed,
}

impl Loaded {
    fn into_entries(self) -> Vec<SessionEntry> {
        match self {
            Loaded::Entries(entries) => entries,
            Loaded::Missing | Loaded::Malformed => Vec::new(),
        }
    }
}

impl JsonLog {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Loaded {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Loaded::Missing,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "session log unreadable");
                return Loaded::Malformed;
            }
        };
        if content.trim().is_empty() {
            return Loaded::Entries(Vec::new());
        }
        match serde_json::from_str::<Vec<SessionEntry>>(&content) {
            Ok(entries) => Loaded::Entries(entries),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "session log malformed, treating as empty");
                Loaded::Malformed
            }
        }
    }

    /// Read, apply `edit` and write back. `edit` returns `None` to skip the write.
    fn update<F>(&self, edit: F) -> Result<LogWrite, LogError>
    where
        F: FnOnce(&mut Vec<SessionEntry>) -> Option<()>,
    {
        let loaded = self.load();
        let malformed = matches!(loaded, Loaded::Malformed);
        let mut entries = loaded.into_entries();
        if edit(&mut entries).is_none() {
            return Ok(LogWrite::NoOpenSession);
        }
        if malformed {
            self.backup()?;
        }
        self.write_atomic(&entries)?;
        Ok(LogWrite::Written)
    }

    /// Copy the unparseable file aside. The rewrite must not go ahead
    /// without this copy.
    fn backup(&self) -> Result<(), LogError> {
        let backup = self.backup_path();
        std::fs::copy(&self.path, &backup).map_err(|source| LogError::Write {
            path: backup.clone(),
            source,
        })?;
        tracing::warn!(path = %backup.display(), "malformed session log backed up");
        Ok(())
    }

    fn backup_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".bak");
        self.path.with_file_name(name)
    }

    fn write_atomic(&self, entries: &[SessionEntry]) -> Result<(), LogError> {
        ensure_parent(&self.path)?;
        let json = serde_json::to_string_pretty(entries)?;

        let mut tmp_name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        let write_err = |source| LogError::Write {
            path: tmp_path.clone(),
            source,
        };
        let mut file = std::fs::File::create(&tmp_path).map_err(write_err)?;
        file.write_all(json.as_bytes()).map_err(write_err)?;
        file.write_all(b"\n").map_err(write_err)?;
        file.sync_all().map_err(write_err)?;
        drop(file);

        std::fs::rename(&tmp_path, &self.path).map_err(|source| LogError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

impl SessionLog for JsonLog {
    fn start_at(&mut self, task: &str, at: DateTime<Local>) -> Result<LogWrite, LogError> {
        let result = self.update(|entries| {
            if let Some(previous) = entries.last_mut() {
                previous.closed = true;
            }
            entries.push(SessionEntry::new(task, at));
            Some(())
        })?;
        tracing::info!(task, path = %self.path.display(), "session started");
        Ok(result)
    }

    fn note_at(&mut self, text: &str, at: DateTime<Local>) -> Result<LogWrite, LogError> {
        self.update(|entries| {
            let open = entries.last_mut().filter(|e| e.is_open())?;
            open.notes.push(Note {
                at,
                text: text.to_string(),
            });
            Some(())
        })
    }

    fn done_at(&mut self, reflection: &str, _at: DateTime<Local>) -> Result<LogWrite, LogError> {
        self.update(|entries| {
            let open = entries.last_mut().filter(|e| e.is_open())?;
            open.reflection = Some(reflection.to_string());
            open.closed = true;
            Some(())
        })
    }

    fn has_open_session(&self) -> bool {
        self.load()
            .into_entries()
            .last()
            .is_some_and(SessionEntry::is_open)
    }

    fn entries(&self) -> Vec<SessionEntry> {
        self.load().into_entries()
    }

    fn location(&self) -> &Path {
        &self.path
    }

    fn format(&self) -> LogFormat {
        LogFormat::Json
    }
}
