//! Single-fire shutdown signal shared by the supervisor and its pumps.

use std::sync::Arc;
use tokio::sync::watch;

/// Once fired it stays fired. Clones observe the same signal.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Fires the signal. Firing an already fired signal is a no-op.
    pub fn fire(&self) {
        self.tx.send_if_modified(|fired| !std::mem::replace(fired, true));
    }

    pub fn is_fired(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once the signal has fired, immediately if it already has.
    pub async fn fired(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|fired| *fired).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_starts_unfired() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_fired());
    }

    #[test]
    fn test_fire_is_idempotent() {
        let signal = ShutdownSignal::new();
        signal.fire();
        signal.fire();
        assert!(signal.is_fired());
    }

    #[test]
    fn test_clones_share_state() {
        let signal = ShutdownSignal::new();
        let other = signal.clone();
        other.fire();
        assert!(signal.is_fired());
    }

    #[tokio::test]
    async fn test_fired_resolves_after_fire() {
        let signal = ShutdownSignal::new();
        let waiter = {
            let signal = signal.clone();
            tokio::spawn(async move { signal.fired().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        signal.fire();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter did not observe the signal")
            .expect("waiter panicked");
    }

    #[tokio::test]
    async fn test_fired_resolves_when_already_fired() {
        let signal = ShutdownSignal::new();
        signal.fire();
        tokio::time::timeout(Duration::from_millis(100), signal.fired())
            .await
            .expect("an already fired signal should resolve immediately");
        // Observing it again still resolves.
        tokio::time::timeout(Duration::from_millis(100), signal.fired())
            .await
            .expect("observing twice should resolve");
    }
}
