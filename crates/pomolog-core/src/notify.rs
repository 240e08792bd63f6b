//! Phase-completion notifications.
//!
//! The controller builds a [`Notification`] for each completed phase and hands
//! it to a [`NotificationSink`]. Whether the sink manages to show anything is
//! not the timer's concern.

use serde::{Deserialize, Serialize};

use crate::timer::{Durations, Phase};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub phase: Phase,
    pub title: String,
    pub body: String,
}

impl Notification {
    /// Content for a completed phase. `None` for `Idle`, which never completes.
    pub fn for_phase(phase: Phase, durations: &Durations) -> Option<Self> {
        let (title, body) = match phase {
            Phase::Working => (
                "Time's up!".to_string(),
                format!("Take a {}-minute break.", durations.break_minutes()),
            ),
            Phase::OnBreak => (
                "Break over!".to_string(),
                "Ready for another session?".to_string(),
            ),
            Phase::Idle => return None,
        };
        Some(Self { phase, title, body })
    }
}

pub trait NotificationSink: Send {
    fn send(&mut self, notification: &Notification);
}

impl<F> NotificationSink for F
where
    F: FnMut(&Notification) + Send,
{
    fn send(&mut self, notification: &Notification) {
        self(notification)
    }
}

/// Emits notifications as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn send(&mut self, notification: &Notification) {
        tracing::info!(
            phase = %notification.phase,
            title = %notification.title,
            "{}",
            notification.body
        );
    }
}
