//! Once-per-second tick source.
//!
//! A [`Ticker`] is a scoped resource: it spawns a tokio task that sends a
//! [`Tick`] through a channel every period, and aborts that task when dropped.
//! Each ticker carries a generation number so the receiver can discard ticks
//! that were already queued when an older ticker was stopped.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub generation: u64,
}

#[derive(Debug)]
pub struct Ticker {
    generation: u64,
    handle: JoinHandle<()>,
}

impl Ticker {
    /// Start ticking. The first tick arrives one full period from now.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(period: Duration, generation: u64, tx: mpsc::Sender<Tick>) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                if tx.send(Tick { generation }).await.is_err() {
                    break;
                }
            }
        });
        Self { generation, handle }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period() {
        let (tx, mut rx) = mpsc::channel(8);
        let ticker = Ticker::spawn(TICK_PERIOD, 7, tx);

        time::sleep(Duration::from_millis(3500)).await;
        let mut received = Vec::new();
        while let Ok(tick) = rx.try_recv() {
            received.push(tick);
        }
        assert_eq!(received.len(), 3);
        assert!(received.iter().all(|t| t.generation == 7));
        assert_eq!(ticker.generation(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_stops_ticking() {
        let (tx, mut rx) = mpsc::channel(8);
        let ticker = Ticker::spawn(TICK_PERIOD, 1, tx);
        time::sleep(Duration::from_millis(1500)).await;
        drop(ticker);
        while rx.try_recv().is_ok() {}

        time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }
}
