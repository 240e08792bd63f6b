//! Timer engine implementation.
//!
//! The engine is a pure state machine counting whole seconds. It owns no
//! thread and no timer: the owner calls `tick()` once per elapsed second while
//! [`TimerEngine::is_running`] is true (see [`super::Ticker`]).
//!
//! ## State Transitions
//!
//! ```text
//! Idle --start--> Working --0s--> Working(awaiting reflection)
//!                                   --start_break--> OnBreak --0s--> Idle
//! any --reset--> Idle
//! ```
//!
//! Calls that are illegal in the current state are no-ops and return `None`.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(Durations::default(), |phase| notify(phase));
//! engine.start("write report");
//! // Once per second while engine.is_running():
//! engine.tick(); // Returns Some(Event::PhaseCompleted) at zero
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::phase::{Durations, Phase};
use crate::events::Event;

/// Invoked exactly once per completed `Working` or `OnBreak` phase.
pub type CompletionHandler = Box<dyn FnMut(Phase) + Send>;

/// Observable timer state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub phase: Phase,
    pub remaining_secs: u64,
    pub paused: bool,
    pub current_task: String,
    /// True only between a work countdown hitting zero and `start_break()`.
    pub awaiting_reflection: bool,
}

impl TimerState {
    fn idle(durations: &Durations) -> Self {
        Self {
            phase: Phase::Idle,
            remaining_secs: durations.work_secs(),
            paused: false,
            current_task: String::new(),
            awaiting_reflection: false,
        }
    }
}

/// Core timer engine.
pub struct TimerEngine {
    state: TimerState,
    durations: Durations,
    /// Length of the phase in progress, captured when it started.
    phase_total_secs: u64,
    on_complete: CompletionHandler,
}

impl std::fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerEngine")
            .field("state", &self.state)
            .field("durations", &self.durations)
            .field("phase_total_secs", &self.phase_total_secs)
            .finish_non_exhaustive()
    }
}

impl TimerEngine {
    /// Create an idle engine. `on_complete` is called synchronously from
    /// `tick()`; it cannot reach back into the engine.
    pub fn new(durations: Durations, on_complete: impl FnMut(Phase) + Send + 'static) -> Self {
        Self {
            state: TimerState::idle(&durations),
            durations,
            phase_total_secs: durations.work_secs(),
            on_complete: Box::new(on_complete),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn remaining_secs(&self) -> u64 {
        self.state.remaining_secs
    }

    pub fn is_paused(&self) -> bool {
        self.state.paused
    }

    pub fn current_task(&self) -> &str {
        &self.state.current_task
    }

    pub fn awaiting_reflection(&self) -> bool {
        self.state.awaiting_reflection
    }

    pub fn durations(&self) -> Durations {
        self.durations
    }

    /// Whether a countdown is progressing, i.e. the owner should be ticking.
    pub fn is_running(&self) -> bool {
        self.state.phase != Phase::Idle && !self.state.paused && self.state.remaining_secs > 0
    }

    /// 0.0 .. 1.0 progress within the current phase; 0.0 while idle.
    pub fn progress(&self) -> f64 {
        if self.state.phase == Phase::Idle || self.phase_total_secs == 0 {
            return 0.0;
        }
        let fraction = 1.0 - (self.state.remaining_secs as f64 / self.phase_total_secs as f64);
        fraction.clamp(0.0, 1.0)
    }

    /// Remaining time as zero-padded `MM:SS`.
    pub fn display_time(&self) -> String {
        let m = self.state.remaining_secs / 60;
        let s = self.state.remaining_secs % 60;
        format!("{m:02}:{s:02}")
    }

    /// Compact title for a tray or status bar.
    pub fn status_title(&self) -> String {
        match self.state.phase {
            Phase::Idle => "🍅".to_string(),
            Phase::Working | Phase::OnBreak => format!("🍅 {}", self.display_time()),
        }
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            phase: self.state.phase,
            remaining_secs: self.state.remaining_secs,
            paused: self.state.paused,
            task: self.state.current_task.clone(),
            awaiting_reflection: self.state.awaiting_reflection,
            progress: self.progress(),
            display_time: self.display_time(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self, task: &str) -> Option<Event> {
        if self.state.phase != Phase::Idle {
            return None;
        }
        self.state.current_task = task.to_string();
        self.enter(Phase::Working, self.durations.work_secs());
        tracing::debug!(task, secs = self.durations.work_secs(), "work phase started");
        Some(Event::TimerStarted {
            task: task.to_string(),
            duration_secs: self.durations.work_secs(),
            at: Utc::now(),
        })
    }

    /// Idempotent: pausing twice yields one event.
    pub fn pause(&mut self) -> Option<Event> {
        if self.state.phase == Phase::Idle || self.state.paused {
            return None;
        }
        self.state.paused = true;
        Some(Event::TimerPaused {
            phase: self.state.phase,
            remaining_secs: self.state.remaining_secs,
            at: Utc::now(),
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        if self.state.phase == Phase::Idle || !self.state.paused {
            return None;
        }
        self.state.paused = false;
        Some(Event::TimerResumed {
            phase: self.state.phase,
            remaining_secs: self.state.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Accepted once a work countdown has reached zero, whether or not a
    /// reflection was written.
    pub fn start_break(&mut self) -> Option<Event> {
        if self.state.phase != Phase::Working || self.state.remaining_secs != 0 {
            return None;
        }
        self.enter(Phase::OnBreak, self.durations.break_secs());
        tracing::debug!(secs = self.durations.break_secs(), "break started");
        Some(Event::BreakStarted {
            duration_secs: self.durations.break_secs(),
            at: Utc::now(),
        })
    }

    /// Valid from any state; safe to repeat.
    pub fn reset(&mut self) -> Option<Event> {
        self.go_idle();
        self.state.current_task.clear();
        Some(Event::TimerReset { at: Utc::now() })
    }

    /// Advance one second. Returns `Some(Event::PhaseCompleted)` when the
    /// countdown reaches zero. Ignored while idle, paused or already at zero.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.is_running() {
            return None;
        }
        self.state.remaining_secs -= 1;
        if self.state.remaining_secs > 0 {
            return None;
        }

        let completed = self.state.phase;
        (self.on_complete)(completed);
        if completed == Phase::Working {
            self.state.awaiting_reflection = true;
        } else {
            self.go_idle();
        }
        tracing::info!(phase = %completed, task = %self.state.current_task, "phase completed");
        Some(Event::PhaseCompleted {
            phase: completed,
            task: self.state.current_task.clone(),
            at: Utc::now(),
        })
    }

    /// Replace the configured lengths. Applies from the next phase start; an
    /// idle engine also shows the new work length immediately.
    pub fn set_durations(&mut self, durations: Durations) {
        self.durations = durations;
        if self.state.phase == Phase::Idle {
            self.state.remaining_secs = durations.work_secs();
            self.phase_total_secs = durations.work_secs();
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn enter(&mut self, phase: Phase, secs: u64) {
        self.state.phase = phase;
        self.state.remaining_secs = secs;
        self.state.paused = false;
        self.state.awaiting_reflection = false;
        self.phase_total_secs = secs;
    }

    fn go_idle(&mut self) {
        self.state.phase = Phase::Idle;
        self.state.remaining_secs = self.durations.work_secs();
        self.state.paused = false;
        self.state.awaiting_reflection = false;
        self.phase_total_secs = self.durations.work_secs();
    }
}
