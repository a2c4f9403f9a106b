//! One-shot readiness signal with any number of waiters.

use tokio::sync::watch;

/// Resolving half. Consumed by [`ReadyGate::resolve`], so it resolves at most
/// once; dropping it unresolved closes the gate for every waiter.
#[derive(Debug)]
pub struct ReadyGate<T> {
    tx: watch::Sender<Option<T>>,
}

/// Waiting half. Clone it freely.
#[derive(Debug, Clone)]
pub struct Readiness<T> {
    rx: watch::Receiver<Option<T>>,
}

/// The gate closed before it was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("readiness gate closed before resolving")]
pub struct GateClosed;

/// Create an unresolved gate.
pub fn gate<T>() -> (ReadyGate<T>, Readiness<T>) {
    let (tx, rx) = watch::channel(None);
    (ReadyGate { tx }, Readiness { rx })
}

impl<T> ReadyGate<T> {
    pub fn resolve(self, value: T) {
        self.tx.send_replace(Some(value));
    }
}

impl<T: Clone> Readiness<T> {
    /// Wait for the value. Returns at once if the gate already resolved.
    pub async fn wait(&self) -> Result<T, GateClosed> {
        let mut rx = self.rx.clone();
        let value = rx.wait_for(Option::is_some).await.map_err(|_| GateClosed)?;
        value.clone().ok_or(GateClosed)
    }

    pub fn is_resolved(&self) -> bool {
        self.rx.borrow().is_some()
    }
}
