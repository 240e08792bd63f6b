//! Resident focus timer.
//!
//! Reads line commands from stdin and writes replies and notifications to
//! stdout as JSON. Diagnostics go to stderr.

use pomolog_core::error::Result;
use pomolog_core::{
    Config, Controller, ControllerHandle, Notification, NotificationSink, SettingsError,
    TomlSettings, TracingNotifier,
};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::Input;

/// Prints each notification to stdout and mirrors it to the trace log.
struct StdoutNotifier;

impl NotificationSink for StdoutNotifier {
    fn send(&mut self, notification: &Notification) {
        TracingNotifier.send(notification);
        if let Err(e) = print_json(notification) {
            tracing::warn!(error = %e, "notification not printed");
        }
    }
}

fn print_json(value: &impl Serialize) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

struct App {
    handle: ControllerHandle,
    store: TomlSettings,
    config: Config,
}

impl App {
    /// Returns `false` once the user asks to quit.
    async fn dispatch(&mut self, input: Input) -> Result<bool> {
        match input {
            Input::Timer(command) => {
                let outcome = self.handle.send(command).await?;
                print_json(&outcome)?;
            }
            Input::Config(None) => print_json(&self.config)?,
            Input::Config(Some(key)) => match self.config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(SettingsError::UnknownKey(key).into()),
            },
            Input::Set { key, value } => {
                let mut next = self.config.clone();
                next.set(&key, &value)?;
                next.save(&mut self.store)?;
                let outcome = self.handle.reconfigure(next.clone()).await?;
                self.config = next;
                tracing::info!(key = %key, value = %value, "setting saved");
                print_json(&outcome)?;
            }
            Input::Help => println!("{}", commands::HELP),
            Input::Quit => return Ok(false),
        }
        Ok(true)
    }
}

async fn run() -> Result<()> {
    let store = TomlSettings::open_default()?;
    let config = Config::load(&store);
    let log = config.log.open();
    tracing::info!(
        settings = %store.path().display(),
        log = %log.location().display(),
        format = %config.log.format,
        work_minutes = config.timer.work_minutes,
        break_minutes = config.timer.break_minutes,
        "pomolog starting"
    );

    let handle = Controller::new(config.clone(), log, StdoutNotifier).spawn();
    let mut app = App {
        handle,
        store,
        config,
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = match commands::parse(&line) {
            Ok(Some(input)) => input,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("error: {e}");
                continue;
            }
        };
        match app.dispatch(input).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => eprintln!("error: {e}"),
        }
    }

    tracing::info!("pomolog shut down");
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
