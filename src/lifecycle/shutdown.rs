//! Shutdown coordination for the gateway.

use tokio::sync::broadcast;

/// Coordinator for graceful shutdown.
///
/// The listener and any background task subscribe; one `trigger` stops them all.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Signal every subscriber. Safe to call more than once.
    pub fn trigger(&self) {
        if self.tx.send(()).is_err() {
            tracing::debug!("Shutdown triggered with no subscribers");
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve once the receiver observes a shutdown, or its sender is gone.
pub async fn wait(mut rx: broadcast::Receiver<()>) {
    // Lagged and Closed both mean shutdown already happened.
    let _ = rx.recv().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_reaches_all_subscribers() {
        let shutdown = Shutdown::new();
        let a = tokio::spawn(wait(shutdown.subscribe()));
        let b = tokio::spawn(wait(shutdown.subscribe()));

        shutdown.trigger();

        tokio::time::timeout(Duration::from_secs(1), async {
            a.await.unwrap();
            b.await.unwrap();
        })
        .await
        .expect("subscribers did not observe shutdown");
    }

    #[tokio::test]
    async fn test_dropped_sender_releases_waiters() {
        let shutdown = Shutdown::new();
        let rx = shutdown.subscribe();
        drop(shutdown);
        tokio::time::timeout(Duration::from_secs(1), wait(rx)).await.unwrap();
    }
}
