//! Dated Markdown journal: one `YYYY-MM-DD.md` file per local day.
//!
//! ```markdown
//! ## 09:00 — write report
//!
//! ### Notes
//!
//! outline done
//!
//! ### Reflection
//!
//! first draft finished
//!
//! ---
//! ```
//!
//! Every call appends to the end of a day file. A session stays bound to the
//! file of the day it started in, so notes written after midnight land with
//! their session. Notes carry no time of their own in this format; on reload
//! they take the session start time.
//!
//! Note and reflection lines that would read back as structure (blank, `---`,
//! starting with `#` or `\`) are written with a leading `\`, which the
//! parser strips again. Each note therefore stays a single paragraph. Line
//! breaks in a task title are written as spaces.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone};

use super::{append_text, LogFormat, LogWrite, Note, SessionEntry, SessionLog};
use crate::error::LogError;

const NOTES_HEADER: &str = "### Notes";
const REFLECTION_HEADER: &str = "### Reflection";
const SESSION_RULE: &str = "---";
const TITLE_SEPARATOR: &str = " — ";

#[derive(Debug, Clone)]
struct OpenSession {
    file: PathBuf,
    notes_header_written: bool,
}

#[derive(Debug)]
pub struct MarkdownJournal {
    dir: PathBuf,
    open: Option<OpenSession>,
}

impl MarkdownJournal {
    /// Open the journal in `dir`, picking up a session left open in the most
    /// recent day file.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let open = day_files(&dir).pop().and_then(|(date, file)| {
            let content = std::fs::read_to_string(&file).ok()?;
            let last = parse_day(date, &content).pop()?;
            last.is_open().then(|| OpenSession {
                file,
                notes_header_written: !last.notes.is_empty(),
            })
        });
        if open.is_some() {
            tracing::debug!(dir = %dir.display(), "recovered open session from journal");
        }
        Self { dir, open }
    }

    pub fn day_file(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}.md", date.format("%Y-%m-%d")))
    }
}

impl SessionLog for MarkdownJournal {
    fn start_at(&mut self, task: &str, at: DateTime<Local>) -> Result<LogWrite, LogError> {
        let file = self.day_file(at.date_naive());
        let prefix = if file.exists() { "\n" } else { "" };
        append_text(
            &file,
            &format!(
                "{prefix}## {}{TITLE_SEPARATOR}{}\n\n",
                at.format("%H:%M"),
                single_line(task)
            ),
        )?;
        tracing::info!(task, path = %file.display(), "session started");
        self.open = Some(OpenSession {
            file,
            notes_header_written: false,
        });
        Ok(LogWrite::Written)
    }

    fn note_at(&mut self, text: &str, _at: DateTime<Local>) -> Result<LogWrite, LogError> {
        let Some(session) = self.open.as_mut() else {
            return Ok(LogWrite::NoOpenSession);
        };
        if !session.notes_header_written {
            append_text(&session.file, &format!("{NOTES_HEADER}\n\n"))?;
            session.notes_header_written = true;
        }
        append_text(&session.file, &format!("{}\n\n", escape_block(text)))?;
        Ok(LogWrite::Written)
    }

    fn done_at(&mut self, reflection: &str, _at: DateTime<Local>) -> Result<LogWrite, LogError> {
        let Some(session) = self.open.as_ref() else {
            return Ok(LogWrite::NoOpenSession);
        };
        append_text(
            &session.file,
            &format!(
                "{REFLECTION_HEADER}\n\n{}\n\n{SESSION_RULE}\n",
                escape_block(reflection)
            ),
        )?;
        self.open = None;
        Ok(LogWrite::Written)
    }

    fn has_open_session(&self) -> bool {
        self.open.is_some()
    }

    fn entries(&self) -> Vec<SessionEntry> {
        let mut entries: Vec<SessionEntry> = day_files(&self.dir)
            .into_iter()
            .filter_map(|(date, file)| {
                std::fs::read_to_string(&file)
                    .ok()
                    .map(|content| parse_day(date, &content))
            })
            .flatten()
            .collect();
        let count = entries.len();
        for entry in entries.iter_mut().take(count.saturating_sub(1)) {
            entry.closed = true;
        }
        entries
    }

    fn location(&self) -> &Path {
        &self.dir
    }

    fn format(&self) -> LogFormat {
        LogFormat::Markdown
    }
}

/// Day files in `dir`, oldest first. Files not named `YYYY-MM-DD.md` are ignored.
fn day_files(dir: &Path) -> Vec<(NaiveDate, PathBuf)> {
    let Ok(read_dir) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<(NaiveDate, PathBuf)> = read_dir
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "md"))
        .filter_map(|path| {
            let stem = path.file_stem()?.to_str()?;
            let date = NaiveDate::parse_from_str(stem, "%Y-%m-%d").ok()?;
            Some((date, path))
        })
        .collect();
    files.sort_by_key(|(date, _)| *date);
    files
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Title,
    Notes,
    Reflection,
}

struct DayParser<'a> {
    date: NaiveDate,
    entries: Vec<SessionEntry>,
    current: Option<SessionEntry>,
    section: Section,
    paragraph: Vec<&'a str>,
}

impl<'a> DayParser<'a> {
    fn flush_paragraph(&mut self) {
        if self.paragraph.is_empty() {
            return;
        }
        let text = self.paragraph.join("\n");
        self.paragraph.clear();
        let Some(entry) = self.current.as_mut() else {
            return;
        };
        match self.section {
            Section::Title => {}
            Section::Notes => entry.notes.push(Note {
                at: entry.started_at,
                text,
            }),
            Section::Reflection => {
                entry.reflection = Some(match entry.reflection.take() {
                    Some(previous) => format!("{previous}\n\n{text}"),
                    None => text,
                });
            }
        }
    }

    fn finish_entry(&mut self, closed: bool) {
        self.flush_paragraph();
        if let Some(mut entry) = self.current.take() {
            entry.closed = closed;
            self.entries.push(entry);
        }
    }

    fn line(&mut self, line: &'a str) {
        if let Some(title) = line.strip_prefix("## ") {
            self.finish_entry(true);
            self.current = parse_title(self.date, title);
            self.section = Section::Title;
        } else if line == NOTES_HEADER {
            self.flush_paragraph();
            self.section = Section::Notes;
        } else if line == REFLECTION_HEADER {
            self.flush_paragraph();
            self.section = Section::Reflection;
        } else if line == SESSION_RULE {
            self.finish_entry(true);
        } else if line.trim().is_empty() {
            self.flush_paragraph();
        } else {
            self.paragraph.push(line.strip_prefix('\\').unwrap_or(line));
        }
    }
}

fn needs_escape(line: &str) -> bool {
    line.trim().is_empty() || line == SESSION_RULE || line.starts_with(['#', '\\'])
}

/// Write-side escaping for note and reflection text.
fn escape_block(text: &str) -> String {
    text.split('\n')
        .map(|line| {
            if needs_escape(line) {
                format!("\\{line}")
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn single_line(text: &str) -> String {
    text.lines().collect::<Vec<_>>().join(" ")
}

fn parse_day(date: NaiveDate, content: &str) -> Vec<SessionEntry> {
    let mut parser = DayParser {
        date,
        entries: Vec::new(),
        current: None,
        section: Section::Title,
        paragraph: Vec::new(),
    };
    for line in content.lines() {
        parser.line(line);
    }
    parser.finish_entry(false);
    parser.entries
}

fn parse_title(date: NaiveDate, title: &str) -> Option<SessionEntry> {
    let (time, task) = title.split_once(TITLE_SEPARATOR)?;
    let time = NaiveTime::parse_from_str(time.trim(), "%H:%M").ok()?;
    let started_at = Local.from_local_datetime(&date.and_time(time)).earliest()?;
    Some(SessionEntry::new(task, started_at))
}
