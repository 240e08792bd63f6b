use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Working,
    OnBreak,
}

impl Phase {
    /// Short label shown next to the countdown.
    pub fn label(self) -> &'static str {
        match self {
            Phase::Idle => "Ready",
            Phase::Working => "Work",
            Phase::OnBreak => "Break",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Work and break lengths in seconds.
///
/// Both are positive; construction goes through [`Durations::new`]. Read by
/// the engine at the moment a phase starts, so replacing them mid-phase does
/// not touch an in-progress countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Durations {
    work_secs: u64,
    break_secs: u64,
}

pub const DEFAULT_WORK_SECS: u64 = 25 * 60;
pub const DEFAULT_BREAK_SECS: u64 = 5 * 60;

impl Durations {
    /// Zero inputs are clamped to one second.
    pub fn new(work_secs: u64, break_secs: u64) -> Self {
        Self {
            work_secs: work_secs.max(1),
            break_secs: break_secs.max(1),
        }
    }

    /// Uses saturating arithmetic to prevent overflow with large values.
    pub fn from_minutes(work_min: u32, break_min: u32) -> Self {
        Self::new(
            u64::from(work_min).saturating_mul(60),
            u64::from(break_min).saturating_mul(60),
        )
    }

    pub fn work_secs(&self) -> u64 {
        self.work_secs
    }

    pub fn break_secs(&self) -> u64 {
        self.break_secs
    }

    /// Break length rounded down to whole minutes.
    pub fn break_minutes(&self) -> u64 {
        self.break_secs / 60
    }
}

impl Default for Durations {
    fn default() -> Self {
        Self {
            work_secs: DEFAULT_WORK_SECS,
            break_secs: DEFAULT_BREAK_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_25_and_5_minutes() {
        let d = Durations::default();
        assert_eq!(d.work_secs(), 1500);
        assert_eq!(d.break_secs(), 300);
        assert_eq!(d.break_minutes(), 5);
    }

    #[test]
    fn zero_durations_are_clamped() {
        let d = Durations::new(0, 0);
        assert_eq!(d.work_secs(), 1);
        assert_eq!(d.break_secs(), 1);
    }

    #[test]
    fn minutes_convert_and_clamp() {
        let d = Durations::from_minutes(0, 2);
        assert_eq!(d.work_secs(), 1);
        assert_eq!(d.break_secs(), 120);
        assert_eq!(d.break_minutes(), 2);
    }

    #[test]
    fn phase_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Phase::OnBreak).unwrap(), "\"on_break\"");
        assert_eq!(Phase::Idle.label(), "Ready");
    }
}
