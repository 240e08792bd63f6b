//! Single-owner event loop around the timer engine and the session log.
//!
//! [`Controller::spawn`] moves the engine, the log and the notification sink
//! into one tokio task. Commands from [`ControllerHandle`] and ticks from the
//! [`Ticker`] are handled one at a time in that task, so no two mutations ever
//! overlap. The ticker only exists while the engine is running; it is dropped
//! (and its task aborted) on pause, on phase completion, on reset and when the
//! loop exits.
//!
//! Log write failures do not block transitions: the timer still moves and the
//! reply carries [`LogStatus::Failed`] so the caller can say "log not saved".

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use crate::error::{ControlError, LogError};
use crate::events::Event;
use crate::notify::{Notification, NotificationSink};
use crate::session::{LogWrite, SessionLog};
use crate::storage::{Config, LogConfig};
use crate::timer::{Phase, Tick, Ticker, TimerEngine, TICK_PERIOD};

const COMMAND_BUFFER: usize = 32;
const TICK_BUFFER: usize = 8;

/// What happened to the session log during a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum LogStatus {
    /// The command does not touch the log.
    NotWritten,
    Saved,
    /// A note or reflection arrived with no open session.
    NoOpenSession,
    Failed(String),
}

impl From<Result<LogWrite, LogError>> for LogStatus {
    fn from(result: Result<LogWrite, LogError>) -> Self {
        match result {
            Ok(LogWrite::Written) => LogStatus::Saved,
            Ok(LogWrite::NoOpenSession) => LogStatus::NoOpenSession,
            Err(e) => {
                tracing::warn!(error = %e, "session log not saved");
                LogStatus::Failed(e.to_string())
            }
        }
    }
}

/// Reply to a controller command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    /// `None` when the command was a no-op in the current state.
    pub event: Option<Event>,
    pub log: LogStatus,
}

impl Outcome {
    fn timer(event: Option<Event>) -> Self {
        Self {
            event,
            log: LogStatus::NotWritten,
        }
    }

    fn ignored() -> Self {
        Self::timer(None)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start(String),
    Pause,
    Resume,
    Note(String),
    /// Write the reflection, then start the break.
    Reflect(String),
    /// Start the break without a reflection.
    SkipReflection,
    Reset,
    Snapshot,
    Reconfigure(Config),
}

struct Request {
    command: Command,
    reply: oneshot::Sender<Result<Outcome, ControlError>>,
}

pub struct Controller {
    engine: TimerEngine,
    log: Box<dyn SessionLog>,
    /// Settings the open `log` was built from; may lag `config.log` until
    /// the engine is idle.
    log_config: LogConfig,
    notifier: Box<dyn NotificationSink>,
    config: Config,
    completions: mpsc::UnboundedReceiver<Phase>,
    ticker: Option<Ticker>,
    generation: u64,
    tick_period: Duration,
    tick_tx: mpsc::Sender<Tick>,
    tick_rx: mpsc::Receiver<Tick>,
    events: Option<mpsc::UnboundedSender<Event>>,
}

impl Controller {
    pub fn new(
        config: Config,
        log: Box<dyn SessionLog>,
        notifier: impl NotificationSink + 'static,
    ) -> Self {
        let (completion_tx, completions) = mpsc::unbounded_channel();
        let engine = TimerEngine::new(config.durations(), move |phase| {
            // Receiver lives as long as the controller.
            let _ = completion_tx.send(phase);
        });
        let (tick_tx, tick_rx) = mpsc::channel(TICK_BUFFER);
        Self {
            engine,
            log,
            log_config: config.log.clone(),
            notifier: Box::new(notifier),
            config,
            completions,
            ticker: None,
            generation: 0,
            tick_period: TICK_PERIOD,
            tick_tx,
            tick_rx,
            events: None,
        }
    }

    /// Forward every produced event to `tx`.
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<Event>) -> Self {
        self.events = Some(tx);
        self
    }

    /// Override the one-second tick period.
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn log(&self) -> &dyn SessionLog {
        self.log.as_ref()
    }

    /// Move the controller into its own task. It stops when every handle is
    /// dropped.
    pub fn spawn(self) -> ControllerHandle {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        tokio::spawn(self.run(rx));
        ControllerHandle { tx }
    }

    async fn run(mut self, mut requests: mpsc::Receiver<Request>) {
        tracing::debug!("controller started");
        loop {
            tokio::select! {
                request = requests.recv() => {
                    let Some(request) = request else { break };
                    let outcome = self.handle(request.command);
                    // Caller may have given up waiting.
                    let _ = request.reply.send(outcome);
                }
                Some(tick) = self.tick_rx.recv() => self.on_tick(tick),
            }
        }
        self.ticker = None;
        tracing::debug!("controller stopped");
    }

    /// Apply one command synchronously.
    pub fn handle(&mut self, command: Command) -> Result<Outcome, ControlError> {
        let outcome = match command {
            Command::Start(task) => self.start(&task)?,
            Command::Pause => Outcome::timer(self.engine.pause()),
            Command::Resume => Outcome::timer(self.engine.resume()),
            Command::Note(text) => self.note(&text),
            Command::Reflect(text) => self.reflect(&text),
            Command::SkipReflection => Outcome::timer(self.engine.start_break()),
            Command::Reset => Outcome::timer(self.engine.reset()),
            Command::Snapshot => Outcome::timer(Some(self.engine.snapshot())),
            Command::Reconfigure(config) => self.reconfigure(config),
        };
        if let Some(event) = &outcome.event {
            if !matches!(event, Event::StateSnapshot { .. }) {
                self.publish(event.clone());
            }
        }
        self.sync_ticker();
        Ok(outcome)
    }

    fn start(&mut self, task: &str) -> Result<Outcome, ControlError> {
        let task = task.trim();
        if task.is_empty() {
            return Err(ControlError::EmptyTask);
        }
        if self.engine.phase() != Phase::Idle {
            return Ok(Outcome::ignored());
        }
        self.switch_log();
        let log = LogStatus::from(self.log.start(task));
        Ok(Outcome {
            event: self.engine.start(task),
            log,
        })
    }

    /// Notes belong to the work phase in progress. During a break or while
    /// idle there is no session to add to.
    fn note(&mut self, text: &str) -> Outcome {
        let text = text.trim();
        if text.is_empty() {
            return Outcome::ignored();
        }
        if self.engine.phase() != Phase::Working {
            return Outcome {
                event: None,
                log: LogStatus::NoOpenSession,
            };
        }
        Outcome {
            event: None,
            log: LogStatus::from(self.log.note(text)),
        }
    }

    fn reflect(&mut self, text: &str) -> Outcome {
        let text = text.trim();
        if text.is_empty() || !self.engine.awaiting_reflection() {
            return Outcome::ignored();
        }
        let log = LogStatus::from(self.log.done(text));
        Outcome {
            event: self.engine.start_break(),
            log,
        }
    }

    /// Durations apply from the next phase. A new log location applies from
    /// the next session, so the session in progress keeps its own log.
    fn reconfigure(&mut self, config: Config) -> Outcome {
        self.engine.set_durations(config.durations());
        self.config = config;
        if self.engine.phase() == Phase::Idle {
            self.switch_log();
        } else if self.config.log != self.log_config {
            tracing::info!("session log change deferred until the current session ends");
        }
        Outcome::timer(Some(self.engine.snapshot()))
    }

    fn switch_log(&mut self) {
        if self.config.log == self.log_config {
            return;
        }
        self.log = self.config.log.open();
        self.log_config = self.config.log.clone();
        tracing::info!(
            format = %self.log_config.format,
            path = %self.log.location().display(),
            "session log reconfigured"
        );
    }

    /// Apply one tick. Ticks from a stopped ticker are discarded.
    pub fn on_tick(&mut self, tick: Tick) {
        let current = self.ticker.as_ref().map(Ticker::generation);
        if current != Some(tick.generation) {
            return;
        }
        let event = self.engine.tick();
        while let Ok(phase) = self.completions.try_recv() {
            if let Some(notification) = Notification::for_phase(phase, &self.engine.durations()) {
                self.notifier.send(&notification);
            }
        }
        if let Some(event) = event {
            self.publish(event);
        }
        self.sync_ticker();
    }

    fn publish(&self, event: Event) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    /// Keep exactly one ticker alive while the engine runs, none otherwise.
    fn sync_ticker(&mut self) {
        match (self.engine.is_running(), self.ticker.is_some()) {
            (true, false) => {
                self.generation += 1;
                self.ticker = Some(Ticker::spawn(
                    self.tick_period,
                    self.generation,
                    self.tick_tx.clone(),
                ));
            }
            (false, true) => {
                self.ticker = None;
            }
            _ => {}
        }
    }
}

/// Cloneable client for a spawned [`Controller`].
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    tx: mpsc::Sender<Request>,
}

impl ControllerHandle {
    pub async fn send(&self, command: Command) -> Result<Outcome, ControlError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Request { command, reply })
            .await
            .map_err(|_| ControlError::Closed)?;
        rx.await.map_err(|_| ControlError::Closed)?
    }

    /// Log the session start, then begin the work countdown.
    pub async fn start(&self, task: impl Into<String>) -> Result<Outcome, ControlError> {
        self.send(Command::Start(task.into())).await
    }

    pub async fn pause(&self) -> Result<Outcome, ControlError> {
        self.send(Command::Pause).await
    }

    pub async fn resume(&self) -> Result<Outcome, ControlError> {
        self.send(Command::Resume).await
    }

    pub async fn note(&self, text: impl Into<String>) -> Result<Outcome, ControlError> {
        self.send(Command::Note(text.into())).await
    }

    pub async fn reflect(&self, text: impl Into<String>) -> Result<Outcome, ControlError> {
        self.send(Command::Reflect(text.into())).await
    }

    pub async fn skip_reflection(&self) -> Result<Outcome, ControlError> {
        self.send(Command::SkipReflection).await
    }

    pub async fn reset(&self) -> Result<Outcome, ControlError> {
        self.send(Command::Reset).await
    }

    pub async fn snapshot(&self) -> Result<Outcome, ControlError> {
        self.send(Command::Snapshot).await
    }

    pub async fn reconfigure(&self, config: Config) -> Result<Outcome, ControlError> {
        self.send(Command::Reconfigure(config)).await
    }
}
