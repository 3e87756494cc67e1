//! Periodic dead-reckoning refresh of tracked vessel positions.

use crate::kinematics::{predict_position, KinematicsError};
use crate::registry::{RegistryError, TrackRegistry};
use crate::shutdown::ShutdownSignal;
use seaguard_env::SeaguardContext;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Advances every tracked vessel along its constant-velocity track.
///
/// Each cycle snapshots the registry, extrapolates every vessel with an
/// update history to "now", and writes the result back with velocity
/// unchanged. This is the sole driver of "current" positions between
/// external sensor updates; vessels that have never been updated are left
/// alone until their first measurement arrives.
pub struct RefreshScheduler<C> {
    ctx: Arc<C>,
    registry: Arc<TrackRegistry>,
    interval: Duration,
}

impl<C: SeaguardContext> RefreshScheduler<C> {
    /// Creates a scheduler ticking at `interval`.
    pub fn new(ctx: Arc<C>, registry: Arc<TrackRegistry>, interval: Duration) -> Self {
        Self {
            ctx,
            registry,
            interval,
        }
    }

    /// Runs one refresh pass at the given time, returning how many vessels
    /// were advanced.
    ///
    /// A write-back can lose to a concurrent deregistration
    /// (`UnknownVessel`) or a newer sensor update (`TimeRegression`); the
    /// stale refresh is discarded in both cases.
    pub fn run_cycle(&self, now: Duration) -> usize {
        let mut refreshed = 0;

        for vessel in self.registry.snapshot() {
            let predicted = match predict_position(&vessel, now) {
                Ok(position) => position,
                Err(KinematicsError::PrecursorMissing(_)) => continue,
            };

            match self
                .registry
                .update(&vessel.id, predicted, vessel.velocity, now)
            {
                Ok(()) => refreshed += 1,
                Err(RegistryError::UnknownVessel(id)) => {
                    debug!(vessel = %id, "refresh skipped: vessel deregistered mid-cycle");
                }
                Err(RegistryError::TimeRegression { id, .. }) => {
                    debug!(vessel = %id, "refresh skipped: newer sensor update won");
                }
                // register-time validations cannot surface from update
                Err(err) => {
                    debug!(error = %err, "refresh write-back rejected");
                }
            }
        }

        refreshed
    }

    /// Runs refresh cycles until shutdown is requested.
    pub async fn run(self, shutdown: ShutdownSignal) {
        loop {
            if shutdown.is_requested() {
                break;
            }

            let now = self.ctx.now();
            let refreshed = self.run_cycle(now);
            trace!(t = now.as_secs_f64(), refreshed, "refresh cycle");

            tokio::select! {
                _ = self.ctx.sleep(self.interval) => {}
                _ = shutdown.wait() => break,
            }
        }

        debug!("refresh scheduler stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vessel::{VesselId, VesselState};
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use seaguard_env::ManualContext;

    fn make_scheduler(
        registry: Arc<TrackRegistry>,
    ) -> (Arc<ManualContext>, RefreshScheduler<ManualContext>) {
        let ctx = ManualContext::shared();
        let scheduler = RefreshScheduler::new(Arc::clone(&ctx), registry, Duration::from_secs(1));
        (ctx, scheduler)
    }

    #[test]
    fn test_cycle_advances_tracked_vessels() {
        let registry = TrackRegistry::shared();
        registry
            .register(
                VesselState::new("0001", Vector3::zeros(), Vector3::new(10.0, 0.0, 0.0))
                    .with_last_update(Duration::ZERO),
            )
            .unwrap();

        let (ctx, scheduler) = make_scheduler(Arc::clone(&registry));
        ctx.advance_time(Duration::from_secs(3));

        let refreshed = scheduler.run_cycle(ctx.now());
        assert_eq!(refreshed, 1);

        let state = registry.get(&VesselId::from("0001")).unwrap();
        assert_relative_eq!(state.position.x, 30.0, epsilon = 1e-9);
        assert_relative_eq!(state.velocity.x, 10.0, epsilon = 1e-12);
        assert_eq!(state.last_update, Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_cycle_skips_untracked_vessels() {
        let registry = TrackRegistry::shared();
        registry
            .register(VesselState::new(
                "fresh",
                Vector3::new(5.0, 0.0, 0.0),
                Vector3::new(100.0, 0.0, 0.0),
            ))
            .unwrap();

        let (ctx, scheduler) = make_scheduler(Arc::clone(&registry));
        ctx.advance_time(Duration::from_secs(10));

        let refreshed = scheduler.run_cycle(ctx.now());
        assert_eq!(refreshed, 0);

        // Never-updated vessel is untouched: no extrapolation, no timestamp
        let state = registry.get(&VesselId::from("fresh")).unwrap();
        assert_eq!(state.position.x, 5.0);
        assert!(!state.is_tracked());
    }

    #[test]
    fn test_cycle_discards_stale_writeback() {
        let registry = TrackRegistry::shared();
        registry
            .register(
                VesselState::new("0001", Vector3::zeros(), Vector3::new(1.0, 0.0, 0.0))
                    .with_last_update(Duration::from_secs(5)),
            )
            .unwrap();

        let (ctx, scheduler) = make_scheduler(Arc::clone(&registry));
        // Clock behind the vessel's own update time: write-back regresses
        ctx.set_time(Duration::from_secs(4));

        let refreshed = scheduler.run_cycle(ctx.now());
        assert_eq!(refreshed, 0);
        assert_eq!(
            registry.get(&VesselId::from("0001")).unwrap().last_update,
            Some(Duration::from_secs(5))
        );
    }

    #[tokio::test]
    async fn test_run_exits_on_shutdown() {
        let registry = TrackRegistry::shared();
        let (_ctx, scheduler) = make_scheduler(registry);

        let shutdown = ShutdownSignal::new();
        shutdown.request();

        // Pre-requested shutdown: run returns without a single sleep
        scheduler.run(shutdown).await;
    }
}
