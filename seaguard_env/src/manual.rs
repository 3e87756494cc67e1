//! Simulation context with a manually advanced virtual clock.

use crate::SeaguardContext;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Simulation context backed by deterministic virtual time.
///
/// The clock only moves when the test advances it (or when a task under
/// test calls `sleep`, which advances it by the requested amount instead
/// of suspending). Clones share the same clock, so a context handed to a
/// component under test can still be driven from the outside.
pub struct ManualContext {
    /// Current virtual time (nanoseconds since simulation start)
    virtual_time_ns: Arc<Mutex<u64>>,
}

impl ManualContext {
    /// Creates a new ManualContext at virtual time zero.
    pub fn new() -> Self {
        Self {
            virtual_time_ns: Arc::new(Mutex::new(0)),
        }
    }

    /// Creates an Arc-wrapped context for sharing.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Advances virtual time by the given duration.
    pub fn advance_time(&self, duration: Duration) {
        let mut time = self.virtual_time_ns.lock().unwrap();
        *time += duration.as_nanos() as u64;
    }

    /// Sets the virtual time to a specific value.
    pub fn set_time(&self, time: Duration) {
        let mut current = self.virtual_time_ns.lock().unwrap();
        *current = time.as_nanos() as u64;
    }
}

impl Default for ManualContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ManualContext {
    fn clone(&self) -> Self {
        Self {
            virtual_time_ns: Arc::clone(&self.virtual_time_ns),
        }
    }
}

#[async_trait]
impl SeaguardContext for ManualContext {
    fn now(&self) -> Duration {
        Duration::from_nanos(*self.virtual_time_ns.lock().unwrap())
    }

    async fn sleep(&self, duration: Duration) {
        // In simulation, sleep advances virtual time and yields once so
        // sibling tasks on the same runtime get to observe it.
        self.advance_time(duration);
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_context_time() {
        let ctx = ManualContext::new();
        assert_eq!(ctx.now(), Duration::ZERO);

        ctx.advance_time(Duration::from_secs(1));
        assert_eq!(ctx.now(), Duration::from_secs(1));

        ctx.advance_time(Duration::from_millis(500));
        assert_eq!(ctx.now(), Duration::from_millis(1500));
    }

    #[test]
    fn test_manual_context_set_time() {
        let ctx = ManualContext::new();
        ctx.set_time(Duration::from_secs(42));
        assert_eq!(ctx.now(), Duration::from_secs(42));
    }

    #[test]
    fn test_manual_context_clone_shares_time() {
        let ctx1 = ManualContext::new();
        let ctx2 = ctx1.clone();

        ctx1.advance_time(Duration::from_secs(5));

        // Both should see the same time
        assert_eq!(ctx1.now(), ctx2.now());
    }

    #[tokio::test]
    async fn test_manual_context_sleep_advances() {
        let ctx = ManualContext::new();
        ctx.sleep(Duration::from_secs(3)).await;
        assert_eq!(ctx.now(), Duration::from_secs(3));
    }
}
