//! Append-only session log.
//!
//! A session runs from `start(task)` through any number of `note(text)` calls
//! to an optional `done(reflection)`. Only the most recent session is open;
//! starting another one freezes the previous record.
//!
//! Three interchangeable encodings implement [`SessionLog`]:
//!
//! - [`JsonLog`]: one JSON array per file, rewritten atomically per call
//! - [`TsvLog`]: one `timestamp\tkind\ttext` line appended per call
//! - [`MarkdownJournal`]: one Markdown file per day with a section per session
//!
//! Writes return [`LogWrite::NoOpenSession`] instead of failing when a note or
//! reflection arrives with nothing open. I/O failures surface as [`LogError`].

mod json;
mod markdown;
mod tsv;

pub use json::JsonLog;
pub use markdown::MarkdownJournal;
pub use tsv::TsvLog;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::LogError;

/// A timestamped note inside a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub at: DateTime<Local>,
    pub text: String,
}

/// One work session as recorded in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEntry {
    pub started_at: DateTime<Local>,
    pub task: String,
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub reflection: Option<String>,
    /// Set by `done`; a closed entry accepts no further notes.
    #[serde(default)]
    pub closed: bool,
}

impl SessionEntry {
    pub fn new(task: &str, started_at: DateTime<Local>) -> Self {
        Self {
            started_at,
            task: task.to_string(),
            notes: Vec::new(),
            reflection: None,
            closed: false,
        }
    }

    pub fn is_open(&self) -> bool {
        !self.closed
    }

    pub fn note_texts(&self) -> Vec<&str> {
        self.notes.iter().map(|n| n.text.as_str()).collect()
    }
}

/// Result of a log call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogWrite {
    Written,
    /// `note`/`done` with no open session; nothing was written.
    NoOpenSession,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Tsv,
    #[serde(alias = "md")]
    Markdown,
}

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            LogFormat::Json => "json",
            LogFormat::Tsv => "tsv",
            LogFormat::Markdown => "markdown",
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "tsv" => Ok(LogFormat::Tsv),
            "markdown" | "md" => Ok(LogFormat::Markdown),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Persistence for work sessions.
///
/// The `*_at` methods take the timestamp explicitly; the short forms use the
/// local clock.
pub trait SessionLog: Send {
    /// Open a new session, freezing whatever was open before.
    fn start_at(&mut self, task: &str, at: DateTime<Local>) -> Result<LogWrite, LogError>;

    /// Append a note to the open session.
    fn note_at(&mut self, text: &str, at: DateTime<Local>) -> Result<LogWrite, LogError>;

    /// Record the reflection and close the open session.
    fn done_at(&mut self, reflection: &str, at: DateTime<Local>) -> Result<LogWrite, LogError>;

    fn has_open_session(&self) -> bool;

    /// Re-read everything on disk. Unreadable content yields no entries.
    fn entries(&self) -> Vec<SessionEntry>;

    /// File or directory the log writes to.
    fn location(&self) -> &Path;

    fn format(&self) -> LogFormat;

    fn start(&mut self, task: &str) -> Result<LogWrite, LogError> {
        self.start_at(task, Local::now())
    }

    fn note(&mut self, text: &str) -> Result<LogWrite, LogError> {
        self.note_at(text, Local::now())
    }

    fn done(&mut self, reflection: &str) -> Result<LogWrite, LogError> {
        self.done_at(reflection, Local::now())
    }
}

/// Open a log of the given format at `path`, recovering any open session
/// already on disk.
pub fn open_log(format: LogFormat, path: impl Into<PathBuf>) -> Box<dyn SessionLog> {
    let path = path.into();
    tracing::debug!(format = %format, path = %path.display(), "opening session log");
    match format {
        LogFormat::Json => Box::new(JsonLog::open(path)),
        LogFormat::Tsv => Box::new(TsvLog::open(path)),
        LogFormat::Markdown => Box::new(MarkdownJournal::open(path)),
    }
}

fn ensure_dir(dir: &Path) -> Result<(), LogError> {
    if dir.as_os_str().is_empty() || dir.exists() {
        return Ok(());
    }
    std::fs::create_dir_all(dir).map_err(|source| LogError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

fn ensure_parent(path: &Path) -> Result<(), LogError> {
    match path.parent() {
        Some(parent) => ensure_dir(parent),
        None => Ok(()),
    }
}

/// Append `text` to the end of `path`, creating it if missing. Never truncates.
fn append_text(path: &Path, text: &str) -> Result<(), LogError> {
    ensure_parent(path)?;
    let write_err = |source| LogError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(write_err)?;
    file.write_all(text.as_bytes()).map_err(write_err)?;
    Ok(())
}
