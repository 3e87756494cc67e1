//! Shared cancellation signal for periodic tasks.

use std::sync::Arc;
use tokio::sync::watch;

/// One shared stop flag for every task in a run.
///
/// Tasks check [`is_requested`](Self::is_requested) at the top of each
/// cycle and race [`wait`](Self::wait) against their interval sleep, so a
/// stop request interrupts an in-progress pause instead of letting the
/// task finish a full sleep first. Clones observe the same signal.
pub struct ShutdownSignal {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Creates a fresh, un-requested signal.
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx: Arc::new(tx), rx }
    }

    /// Requests shutdown. Idempotent.
    pub fn request(&self) {
        // send only fails with no receivers; we always hold one
        let _ = self.tx.send(true);
    }

    /// Whether shutdown has been requested.
    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }

    /// Completes once shutdown is requested.
    pub async fn wait(&self) {
        let mut rx = self.rx.clone();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                break;
            }
        }
    }
}

impl Clone for ShutdownSignal {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
            rx: self.rx.clone(),
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
