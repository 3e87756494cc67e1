//! Simulated external sensor feed.
//!
//! The core treats sensor data as an external collaborator that pushes
//! measurements through `TrackRegistry::update`. This feed plays that
//! collaborator: each pass it re-measures every registered vessel with
//! seeded Gaussian position noise, so a run exercises the same
//! update/refresh interleaving a live radar would produce - and does so
//! reproducibly for a given seed.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use nalgebra::Vector3;
use seaguard_core::{RegistryError, ShutdownSignal, TrackRegistry};
use seaguard_env::SeaguardContext;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Seeded noisy measurement source for every registered vessel.
pub struct SensorFeed {
    rng: ChaCha8Rng,
    noise: Normal<f64>,
}

impl SensorFeed {
    /// Creates a feed with the given seed and position-noise standard
    /// deviation in meters.
    ///
    /// Returns `None` for a non-finite or negative deviation.
    pub fn new(seed: u64, noise_std: f64) -> Option<Self> {
        let noise = Normal::new(0.0, noise_std).ok()?;
        Some(Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            noise,
        })
    }

    /// Pushes one noisy measurement per vessel, returning how many were
    /// accepted.
    ///
    /// A measurement can lose to a concurrent dead-reckoning write with a
    /// fresher timestamp (`TimeRegression`) or to a deregistration; stale
    /// measurements are dropped, matching how a real feed's late packets
    /// are treated.
    pub fn apply(&mut self, registry: &TrackRegistry, now: Duration) -> usize {
        let mut accepted = 0;

        for vessel in registry.snapshot() {
            let measured = vessel.position + self.sample_noise();

            match registry.update(&vessel.id, measured, vessel.velocity, now) {
                Ok(()) => accepted += 1,
                Err(RegistryError::TimeRegression { id, .. }) => {
                    debug!(vessel = %id, "stale measurement dropped");
                }
                Err(RegistryError::UnknownVessel(id)) => {
                    debug!(vessel = %id, "measurement for deregistered vessel dropped");
                }
                Err(err) => {
                    debug!(error = %err, "measurement rejected");
                }
            }
        }

        accepted
    }

    /// Runs measurement passes every `interval` until shutdown.
    pub async fn run<C: SeaguardContext>(
        mut self,
        ctx: Arc<C>,
        registry: Arc<TrackRegistry>,
        interval: Duration,
        shutdown: ShutdownSignal,
    ) {
        loop {
            if shutdown.is_requested() {
                break;
            }

            let now = ctx.now();
            let accepted = self.apply(&registry, now);
            trace!(t = now.as_secs_f64(), accepted, "sensor feed pass");

            tokio::select! {
                _ = ctx.sleep(interval) => {}
                _ = shutdown.wait() => break,
            }
        }

        debug!("sensor feed stopped");
    }

    fn sample_noise(&mut self) -> Vector3<f64> {
        Vector3::new(
            self.noise.sample(&mut self.rng),
            self.noise.sample(&mut self.rng),
            self.noise.sample(&mut self.rng),
        )
    }
}
