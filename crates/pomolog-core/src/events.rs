use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::Phase;

/// Every accepted state change produces an Event.
/// Rejected (no-op) commands produce none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        task: String,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// A work or break countdown reached zero.
    PhaseCompleted {
        phase: Phase,
        task: String,
        at: DateTime<Utc>,
    },
    BreakStarted {
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: Phase,
        remaining_secs: u64,
        paused: bool,
        task: String,
        awaiting_reflection: bool,
        /// 0.0 .. 1.0 within the current phase.
        progress: f64,
        display_time: String,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn kind(&self) -> &'static str {
        match self {
            Event::TimerStarted { .. } => "TimerStarted",
            Event::TimerPaused { .. } => "TimerPaused",
            Event::TimerResumed { .. } => "TimerResumed",
            Event::PhaseCompleted { .. } => "PhaseCompleted",
            Event::BreakStarted { .. } => "BreakStarted",
            Event::TimerReset { .. } => "TimerReset",
            Event::StateSnapshot { .. } => "StateSnapshot",
        }
    }
}
