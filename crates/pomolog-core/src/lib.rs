//! # pomolog Core Library
//!
//! Core logic for a personal focus timer: a work/break cycle with an
//! in-progress task, timestamped notes and an append-only record of finished
//! sessions.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a pure second-counting state machine; the owner calls
//!   `tick()` once per elapsed second while it runs
//! - **Ticker**: a scoped tokio task that emits those ticks over a channel
//! - **Controller**: single-owner event loop serializing commands, ticks, log
//!   writes and notifications
//! - **Session Log**: append-only persistence as JSON, TSV or a Markdown journal
//! - **Storage**: key-value settings and the explicit [`Config`] built from them
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`Controller`] / [`ControllerHandle`]: Runtime wiring
//! - [`SessionLog`]: Session persistence
//! - [`SettingsStore`]: Durable settings

pub mod controller;
pub mod error;
pub mod events;
pub mod notify;
pub mod session;
pub mod storage;
pub mod timer;

pub use controller::{Command, Controller, ControllerHandle, LogStatus, Outcome};
pub use error::{ControlError, CoreError, LogError, SettingsError};
pub use events::Event;
pub use notify::{Notification, NotificationSink, TracingNotifier};
pub use session::{
    open_log, JsonLog, LogFormat, LogWrite, MarkdownJournal, Note, SessionEntry, SessionLog,
    TsvLog,
};
pub use storage::{Config, LogConfig, MemorySettings, SettingsStore, TimerConfig, TomlSettings};
pub use timer::{Durations, Phase, Tick, Ticker, TimerEngine, TimerState};
