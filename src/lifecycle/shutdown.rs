//! Shutdown coordination.

use std::future::Future;
use std::time::Duration;

use tokio::sync::broadcast;

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

/// How a drain attempt ended.
#[derive(Debug, PartialEq, Eq)]
pub enum Drain<T> {
    Completed(T),
    TimedOut,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Notify every subscriber. Returns how many were listening.
    pub fn trigger(&self) -> usize {
        self.tx.send(()).unwrap_or(0)
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Trigger shutdown and wait up to `grace` for `draining` to finish.
    pub async fn drain<F: Future>(&self, draining: F, grace: Duration) -> Drain<F::Output> {
        let listeners = self.trigger();
        tracing::info!(listeners, grace_secs = grace.as_secs(), "Graceful shutdown started");

        match tokio::time::timeout(grace, draining).await {
            Ok(output) => Drain::Completed(output),
            Err(_) => {
                tracing::error!(grace_secs = grace.as_secs(), "Forced shutdown after timeout");
                Drain::TimedOut
            }
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
