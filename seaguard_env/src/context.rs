//! Core environment context trait for Seaguard engines.

use async_trait::async_trait;
use std::time::Duration;

/// The central interface for environment interaction.
///
/// This trait abstracts the clock so that the tracking engines can run
/// in both production (tokio) and simulation (virtual time) environments.
///
/// # Implementations
///
/// - **Production**: `TokioContext` - wraps `Instant` and `tokio::time`
/// - **Simulation**: `ManualContext` - a virtual clock advanced by the test
///
/// # Determinism
///
/// All timestamps in the tracking core are `Duration` offsets on this
/// clock. A simulation run that advances the clock in fixed steps
/// reproduces the exact same timestamps on every run.
#[async_trait]
pub trait SeaguardContext: Send + Sync + 'static {
    /// Returns the current monotonic time since context creation.
    ///
    /// This is the time base for every `last_update` timestamp and every
    /// extrapolation. In simulation, this is the virtual clock time.
    fn now(&self) -> Duration;

    /// Suspends execution for the given duration.
    ///
    /// In production: wraps `tokio::time::sleep`
    /// In simulation: advances the virtual clock
    async fn sleep(&self, duration: Duration);
}
