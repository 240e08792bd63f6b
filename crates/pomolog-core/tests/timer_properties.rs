//! Property tests for tick accounting in the timer engine.

use std::sync::{Arc, Mutex};

use pomolog_core::{Durations, Phase, TimerEngine};
use proptest::prelude::*;

fn engine(work: u64, brk: u64) -> (TimerEngine, Arc<Mutex<Vec<Phase>>>) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let sink = calls.clone();
    let engine = TimerEngine::new(Durations::new(work, brk), move |phase| {
        sink.lock().unwrap().push(phase)
    });
    (engine, calls)
}

proptest! {
    #[test]
    fn running_ticks_count_down_exactly(work in 1u64..5_000, n in 0u64..6_000) {
        let (mut engine, calls) = engine(work, 60);
        engine.start("task");
        for _ in 0..n {
            engine.tick();
        }
        prop_assert_eq!(engine.remaining_secs(), work.saturating_sub(n));
        let completions = calls.lock().unwrap().len();
        prop_assert_eq!(completions, usize::from(n >= work));
        prop_assert_eq!(engine.awaiting_reflection(), n >= work);
    }

    #[test]
    fn paused_ticks_are_dropped(
        before in 0u64..500,
        while_paused in 0u64..500,
        after in 0u64..500,
    ) {
        let work = 2_000;
        let (mut engine, _) = engine(work, 60);
        engine.start("task");
        for _ in 0..before {
            engine.tick();
        }
        engine.pause();
        for _ in 0..while_paused {
            engine.tick();
        }
        engine.resume();
        for _ in 0..after {
            engine.tick();
        }
        prop_assert_eq!(engine.remaining_secs(), work - before - after);
    }

    #[test]
    fn break_always_returns_to_idle(work in 1u64..200, brk in 1u64..200, extra in 0u64..50) {
        let (mut engine, calls) = engine(work, brk);
        engine.start("task");
        for _ in 0..work + extra {
            engine.tick();
        }
        prop_assert_eq!(engine.phase(), Phase::Working);
        prop_assert!(engine.start_break().is_some());
        for _ in 0..brk + extra {
            engine.tick();
        }
        prop_assert_eq!(engine.phase(), Phase::Idle);
        prop_assert_eq!(engine.remaining_secs(), work);
        prop_assert_eq!(calls.lock().unwrap().clone(), vec![Phase::Working, Phase::OnBreak]);
    }

    #[test]
    fn reset_is_total(ops in proptest::collection::vec(0u8..6, 0..40)) {
        let (mut engine, _) = engine(3, 2);
        for op in ops {
            match op {
                0 => { engine.start("task"); }
                1 => { engine.pause(); }
                2 => { engine.resume(); }
                3 => { engine.start_break(); }
                4 => { engine.tick(); }
                _ => { engine.reset(); }
            }
            prop_assert!(!engine.awaiting_reflection() || engine.phase() == Phase::Working);
            prop_assert!(!engine.awaiting_reflection() || engine.remaining_secs() == 0);
        }
        engine.reset();
        engine.reset();
        let state = engine.state();
        prop_assert_eq!(state.phase, Phase::Idle);
        prop_assert!(state.current_task.is_empty());
        prop_assert!(!state.awaiting_reflection);
        prop_assert_eq!(state.remaining_secs, 3);
    }
}
