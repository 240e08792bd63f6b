mod engine;
mod phase;
mod ticker;

pub use engine::{CompletionHandler, TimerEngine, TimerState};
pub use phase::{Durations, Phase, DEFAULT_BREAK_SECS, DEFAULT_WORK_SECS};
pub use ticker::{Tick, Ticker, TICK_PERIOD};
