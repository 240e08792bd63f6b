//! Streaming session log: one tab-delimited record per line.
//!
//! ```text
//! 2026-03-14T09:00:00+01:00\tstart\twrite report
//! 2026-03-14T09:05:12+01:00\tnote\toutline done
//! 2026-03-14T09:25:00+01:00\tdone\tfirst draft finished
//! ```
//!
//! Each call appends a single line without reading the file. Backslash, tab,
//! newline and carriage return in the text are escaped so every record stays
//! on one line. The file is scanned once on open to recover whether the last
//! session is still open.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Local, SecondsFormat};

use super::{append_text, LogFormat, LogWrite, Note, SessionEntry, SessionLog};
use crate::error::LogError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordKind {
    Start,
    Note,
    Done,
}

impl RecordKind {
    fn as_str(self) -> &'static str {
        match self {
            RecordKind::Start => "start",
            RecordKind::Note => "note",
            RecordKind::Done => "done",
        }
    }
}

impl FromStr for RecordKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(RecordKind::Start),
            "note" => Ok(RecordKind::Note),
            "done" => Ok(RecordKind::Done),
            _ => Err(()),
        }
    }
}

#[derive(Debug)]
pub struct TsvLog {
    path: PathBuf,
    open: bool,
}

impl TsvLog {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let open = std::fs::read_to_string(&path)
            .map(|content| parse(&content).last().is_some_and(SessionEntry::is_open))
            .unwrap_or(false);
        Self { path, open }
    }

    fn append(&self, kind: RecordKind, text: &str, at: DateTime<Local>) -> Result<(), LogError> {
        let line = format!(
            "{}\t{}\t{}\n",
            at.to_rfc3339_opts(SecondsFormat::Secs, false),
            kind.as_str(),
            escape(text)
        );
        append_text(&self.path, &line)
    }
}

impl SessionLog for TsvLog {
    fn start_at(&mut self, task: &str, at: DateTime<Local>) -> Result<LogWrite, LogError> {
        self.append(RecordKind::Start, task, at)?;
        self.open = true;
        tracing::info!(task, path = %self.path.display(), "session started");
        Ok(LogWrite::Written)
    }

    fn note_at(&mut self, text: &str, at: DateTime<Local>) -> Result<LogWrite, LogError> {
        if !self.open {
            return Ok(LogWrite::NoOpenSession);
        }
        self.append(RecordKind::Note, text, at)?;
        Ok(LogWrite::Written)
    }

    fn done_at(&mut self, reflection: &str, at: DateTime<Local>) -> Result<LogWrite, LogError> {
        if !self.open {
            return Ok(LogWrite::NoOpenSession);
        }
        self.append(RecordKind::Done, reflection, at)?;
        self.open = false;
        Ok(LogWrite::Written)
    }

    fn has_open_session(&self) -> bool {
        self.open
    }

    fn entries(&self) -> Vec<SessionEntry> {
        std::fs::read_to_string(&self.path)
            .map(|content| parse(&content))
            .unwrap_or_default()
    }

    fn location(&self) -> &Path {
        &self.path
    }

    fn format(&self) -> LogFormat {
        LogFormat::Tsv
    }
}

/// Rebuild sessions from log lines. Malformed lines and notes outside a
/// session are skipped.
fn parse(content: &str) -> Vec<SessionEntry> {
    let mut entries: Vec<SessionEntry> = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let Some((at, kind, text)) = parse_line(line) else {
            tracing::warn!(line = lineno + 1, "skipping malformed session log line");
            continue;
        };
        match kind {
            RecordKind::Start => {
                if let Some(previous) = entries.last_mut() {
                    previous.closed = true;
                }
                entries.push(SessionEntry::new(&text, at));
            }
            RecordKind::Note => {
                if let Some(open) = entries.last_mut().filter(|e| e.is_open()) {
                    open.notes.push(Note { at, text });
                }
            }
            RecordKind::Done => {
                if let Some(open) = entries.last_mut().filter(|e| e.is_open()) {
                    open.reflection = Some(text);
                    open.closed = true;
                }
            }
        }
    }
    entries
}

fn parse_line(line: &str) -> Option<(DateTime<Local>, RecordKind, String)> {
    let mut fields = line.splitn(3, '\t');
    let at = DateTime::parse_from_rfc3339(fields.next()?).ok()?;
    let kind = fields.next()?.parse().ok()?;
    let text = unescape(fields.next()?);
    Some((at.with_timezone(&Local), kind, text))
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 14, h, m, 0).unwrap()
    }

    #[test]
    fn writes_one_line_per_call() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.tsv");
        let mut log = TsvLog::open(&path);
        log.start_at("X", at(9, 0)).unwrap();
        log.note_at("A", at(9, 1)).unwrap();
        log.done_at("R", at(9, 25)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        let expected = format!(
            "{}\tstart\tX",
            at(9, 0).to_rfc3339_opts(SecondsFormat::Secs, false)
        );
        assert_eq!(lines[0], expected);
        assert!(lines[1].ends_with("\tnote\tA"));
        assert!(lines[2].ends_with("\tdone\tR"));
        assert!(content.ends_with('\n'));
    }

    #[test]
    fn round_trip_single_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.tsv");
        let mut log = TsvLog::open(&path);
        log.start("X").unwrap();
        log.note("A").unwrap();
        log.note("B").unwrap();
        log.done("R").unwrap();

        let entries = TsvLog::open(&path).entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].task, "X");
        assert_eq!(entries[0].note_texts(), vec!["A", "B"]);
        assert_eq!(entries[0].reflection.as_deref(), Some("R"));
    }

    #[test]
    fn special_characters_stay_on_one_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.tsv");
        let mut log = TsvLog::open(&path);
        let tricky = "tab\there\nnew line \\ back\\nslash\r";
        log.start(tricky).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert_eq!(log.entries()[0].task, tricky);
    }

    #[test]
    fn no_session_means_no_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.tsv");
        let mut log = TsvLog::open(&path);
        assert_eq!(log.note("x").unwrap(), LogWrite::NoOpenSession);
        assert_eq!(log.done("x").unwrap(), LogWrite::NoOpenSession);
        assert!(!path.exists());
    }

    #[test]
    fn recovers_open_session_on_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.tsv");
        TsvLog::open(&path).start("task").unwrap();

        let mut reopened = TsvLog::open(&path);
        assert!(reopened.has_open_session());
        assert_eq!(reopened.note("later").unwrap(), LogWrite::Written);
        reopened.done("ok").unwrap();
        assert!(!TsvLog::open(&path).has_open_session());
        assert_eq!(reopened.entries()[0].note_texts(), vec!["later"]);
    }

    #[test]
    fn never_truncates_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.tsv");
        std::fs::write(&path, "hand written line\n").unwrap();

        let mut log = TsvLog::open(&path);
        assert!(!log.has_open_session());
        log.start("x").unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("hand written line\n"));
        assert_eq!(log.entries().len(), 1);
    }
}
