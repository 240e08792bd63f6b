//! End-to-end tests for a spawned controller driven by its own ticker.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use pomolog_core::{
    Config, Controller, ControllerHandle, Event, LogConfig, LogFormat, LogStatus, Notification,
    Phase, TimerConfig,
};
use tokio::sync::mpsc;

fn config(dir: &std::path::Path, format: LogFormat) -> Config {
    Config {
        timer: TimerConfig {
            work_minutes: 1,
            break_minutes: 1,
        },
        log: LogConfig {
            path: Some(dir.join("log")),
            format,
        },
    }
}

struct Harness {
    handle: ControllerHandle,
    notifications: Arc<Mutex<Vec<Notification>>>,
    events: mpsc::UnboundedReceiver<Event>,
}

fn spawn(config: Config) -> Harness {
    let notifications = Arc::new(Mutex::new(Vec::new()));
    let sink = notifications.clone();
    let (tx, events) = mpsc::unbounded_channel();
    let log = config.log.open();
    let handle = Controller::new(config, log, move |n: &Notification| {
        sink.lock().unwrap().push(n.clone())
    })
    .with_events(tx)
    .spawn();
    Harness {
        handle,
        notifications,
        events,
    }
}

async fn state(handle: &ControllerHandle) -> (Phase, u64, bool, bool) {
    match handle.snapshot().await.unwrap().event {
        Some(Event::StateSnapshot {
            phase,
            remaining_secs,
            paused,
            awaiting_reflection,
            ..
        }) => (phase, remaining_secs, paused, awaiting_reflection),
        other => panic!("expected snapshot, got {other:?}"),
    }
}

// Every wake-up must fall strictly between two ticks of the running ticker,
// which starts one period after the command that started it.
async fn sleep_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[tokio::test(start_paused = true)]
async fn test_ticker_counts_down_while_running() {
    let dir = tempfile::tempdir().unwrap();
    let h = spawn(config(dir.path(), LogFormat::Json));

    let outcome = h.handle.start("deep work").await.unwrap();
    assert_eq!(outcome.log, LogStatus::Saved);

    sleep_ms(5_500).await;
    assert_eq!(state(&h.handle).await, (Phase::Working, 55, false, false));
}

#[tokio::test(start_paused = true)]
async fn test_pause_freezes_countdown() {
    let dir = tempfile::tempdir().unwrap();
    let h = spawn(config(dir.path(), LogFormat::Tsv));

    h.handle.start("x").await.unwrap();
    sleep_ms(3_500).await;
    assert!(h.handle.pause().await.unwrap().event.is_some());

    sleep_ms(10_000).await;
    assert_eq!(state(&h.handle).await, (Phase::Working, 57, true, false));

    assert!(h.handle.resume().await.unwrap().event.is_some());
    sleep_ms(2_500).await;
    assert_eq!(state(&h.handle).await.1, 55);
}

#[tokio::test(start_paused = true)]
async fn test_full_cycle_through_handle() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path(), LogFormat::Markdown);
    let mut h = spawn(cfg.clone());

    h.handle.start("write docs").await.unwrap();
    assert_eq!(
        h.handle.note("outline done").await.unwrap().log,
        LogStatus::Saved
    );

    sleep_ms(60_500).await;
    assert_eq!(state(&h.handle).await, (Phase::Working, 0, false, true));
    assert_eq!(h.notifications.lock().unwrap()[0].title, "Time's up!");

    // Still waiting: no further ticks change anything.
    sleep_ms(5_000).await;
    assert_eq!(state(&h.handle).await, (Phase::Working, 0, false, true));

    let outcome = h.handle.reflect("went well").await.unwrap();
    assert_eq!(outcome.log, LogStatus::Saved);
    assert!(matches!(outcome.event, Some(Event::BreakStarted { .. })));

    sleep_ms(60_500).await;
    assert_eq!(state(&h.handle).await, (Phase::Idle, 60, false, false));
    assert_eq!(h.notifications.lock().unwrap()[1].title, "Break over!");

    let kinds: Vec<&str> = std::iter::from_fn(|| h.events.try_recv().ok())
        .map(|e| e.kind())
        .collect();
    assert_eq!(
        kinds,
        vec!["TimerStarted", "PhaseCompleted", "BreakStarted", "PhaseCompleted"]
    );

    let entries = cfg.log.open().entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].task, "write docs");
    assert_eq!(entries[0].note_texts(), vec!["outline done"]);
    assert_eq!(entries[0].reflection.as_deref(), Some("went well"));
}

#[tokio::test(start_paused = true)]
async fn test_reset_mid_break_stops_ticking() {
    let dir = tempfile::tempdir().unwrap();
    let h = spawn(config(dir.path(), LogFormat::Json));

    h.handle.start("x").await.unwrap();
    sleep_ms(60_500).await;
    h.handle.skip_reflection().await.unwrap();
    // Break ticks fall on x.5 s from here.
    sleep_ms(10_250).await;
    assert_eq!(state(&h.handle).await, (Phase::OnBreak, 50, false, false));

    assert!(h.handle.reset().await.unwrap().event.is_some());
    sleep_ms(120_000).await;
    assert_eq!(state(&h.handle).await, (Phase::Idle, 60, false, false));
    assert_eq!(h.notifications.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_reconfigure_applies_to_next_phase() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(dir.path(), LogFormat::Json);
    let h = spawn(cfg.clone());

    h.handle.start("x").await.unwrap();
    sleep_ms(10_500).await;
    cfg.set("timer.work_minutes", "2").unwrap();
    h.handle.reconfigure(cfg).await.unwrap();
    assert_eq!(state(&h.handle).await.1, 50);

    h.handle.reset().await.unwrap();
    assert_eq!(state(&h.handle).await.1, 120);
}

#[tokio::test(start_paused = true)]
async fn test_custom_tick_period() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path(), LogFormat::Tsv);
    let log = cfg.log.open();
    let handle = Controller::new(cfg, log, |_: &Notification| {})
        .with_tick_period(Duration::from_millis(100))
        .spawn();

    handle.start("sprint").await.unwrap();
    sleep_ms(6_050).await;
    assert_eq!(state(&handle).await, (Phase::Working, 0, false, true));
}
