//! The "Detection" Engine - pairwise conflict evaluation.
//!
//! Each cycle takes one registry snapshot and sweeps every unordered pair
//! of tracked vessels twice: once at present positions (current conflicts)
//! and once at positions extrapolated to a lookahead horizon (predicted
//! conflicts). Both checks run off the same snapshot, so a cycle's findings
//! are internally consistent even while the refresh task keeps writing.

use crate::kinematics::{self, predict_position, KinematicsError};
use crate::orchestrator::RunConfig;
use crate::registry::TrackRegistry;
use crate::shutdown::ShutdownSignal;
use crate::vessel::{ConflictEvent, ThreatLevel, VesselState};
use seaguard_env::SeaguardContext;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Counts of events emitted by one detection cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleOutcome {
    /// Conflicts found at present positions
    pub current: usize,
    /// Conflicts found at extrapolated positions
    pub predicted: usize,
}

/// Periodic pairwise conflict sweep over the shared registry.
///
/// Detected conflicts are pushed into an event channel for an external
/// sink; the detector never formats or prints anything itself. When a
/// bounded run duration is configured, the detector doubles as the run's
/// watchdog and requests shutdown once the duration elapses.
pub struct ConflictDetector<C> {
    ctx: Arc<C>,
    registry: Arc<TrackRegistry>,
    interval: Duration,
    prediction_interval: Duration,
    run_duration: Option<Duration>,
    /// Simulation start on the context clock; event offsets are relative
    /// to this.
    start: Duration,
    events: mpsc::UnboundedSender<ConflictEvent>,
}

impl<C: SeaguardContext> ConflictDetector<C> {
    /// Creates a detector; the current context time becomes the run start.
    pub fn new(
        ctx: Arc<C>,
        registry: Arc<TrackRegistry>,
        config: &RunConfig,
        events: mpsc::UnboundedSender<ConflictEvent>,
    ) -> Self {
        let start = ctx.now();
        Self {
            ctx,
            registry,
            interval: config.update_interval,
            prediction_interval: config.prediction_interval,
            run_duration: config.run_duration,
            start,
            events,
        }
    }

    /// Evaluates every unordered pair in one snapshot.
    ///
    /// Vessels with no update history are excluded entirely; a pair is
    /// never compared against itself or evaluated twice.
    pub fn run_cycle(&self, now: Duration) -> Result<CycleOutcome, DetectorError> {
        let snapshot = self.registry.snapshot();
        let tracked: Vec<&VesselState> = snapshot.iter().filter(|v| v.is_tracked()).collect();

        let mut outcome = CycleOutcome::default();

        for i in 0..tracked.len() {
            for j in (i + 1)..tracked.len() {
                let (first, second) = (tracked[i], tracked[j]);

                if kinematics::is_colliding(first, second) {
                    self.emit(ConflictEvent::Current {
                        first: first.id.clone(),
                        second: second.id.clone(),
                        elapsed: now.saturating_sub(self.start),
                        distance: kinematics::distance(&first.position, &second.position),
                        threat: kinematics::classify_threat(first, second),
                    })?;
                    outcome.current += 1;
                }

                if let Some(event) = self.predict_pair(first, second) {
                    self.emit(event)?;
                    outcome.predicted += 1;
                }
            }
        }

        Ok(outcome)
    }

    /// Extrapolates one pair to the lookahead horizon and checks overlap.
    ///
    /// The horizon anchors on the fresher of the two records, so both
    /// extrapolations target the same instant.
    fn predict_pair(&self, first: &VesselState, second: &VesselState) -> Option<ConflictEvent> {
        let future_time =
            first.last_update?.max(second.last_update?) + self.prediction_interval;

        let (p1, p2) = match (
            predict_position(first, future_time),
            predict_position(second, future_time),
        ) {
            (Ok(p1), Ok(p2)) => (p1, p2),
            (Err(KinematicsError::PrecursorMissing(_)), _)
            | (_, Err(KinematicsError::PrecursorMissing(_))) => return None,
        };

        let separation = kinematics::distance(&p1, &p2);
        let combined = first.safezone_radius + second.safezone_radius;
        if separation >= combined {
            return None;
        }

        Some(ConflictEvent::Predicted {
            first: first.id.clone(),
            second: second.id.clone(),
            horizon: future_time.saturating_sub(self.start),
            distance: separation,
            threat: ThreatLevel::classify(separation, combined),
        })
    }

    fn emit(&self, event: ConflictEvent) -> Result<(), DetectorError> {
        self.events
            .send(event)
            .map_err(|_| DetectorError::EventSinkClosed)
    }

    /// Runs detection cycles until shutdown is requested or the configured
    /// run duration elapses (in which case this task requests shutdown on
    /// behalf of the whole run).
    pub async fn run(self, shutdown: ShutdownSignal) -> Result<(), DetectorError> {
        loop {
            if shutdown.is_requested() {
                break;
            }

            let now = self.ctx.now();
            if let Some(duration) = self.run_duration {
                if now.saturating_sub(self.start) >= duration {
                    debug!(secs = duration.as_secs_f64(), "run duration elapsed");
                    shutdown.request();
                    break;
                }
            }

            let outcome = self.run_cycle(now)?;
            trace!(
                t = now.as_secs_f64(),
                current = outcome.current,
                predicted = outcome.predicted,
                "detection cycle"
            );

            tokio::select! {
                _ = self.ctx.sleep(self.interval) => {}
                _ = shutdown.wait() => break,
            }
        }

        debug!("conflict detector stopped");
        Ok(())
    }
}

/// Errors that can occur inside the conflict detector.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DetectorError {
    /// The event consumer dropped its receiver; emitting conflicts into
    /// the void would silently swallow them, so the run is stopped instead.
    #[error("conflict event sink closed")]
    EventSinkClosed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vessel::VesselState;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use seaguard_env::ManualContext;

    fn detector_with(
        registry: Arc<TrackRegistry>,
        config: RunConfig,
    ) -> (
        ConflictDetector<ManualContext>,
        mpsc::UnboundedReceiver<ConflictEvent>,
    ) {
        let ctx = ManualContext::shared();
        let (tx, rx) = mpsc::unbounded_channel();
        (ConflictDetector::new(ctx, registry, &config, tx), rx)
    }

    fn head_on_pair(registry: &TrackRegistry) {
        // The classic head-on approach: closing speed 20 m/s from 100 m
        // apart, combined safezone 80 m -> overlap begins after t = 1 s.
        registry
            .register(
                VesselState::new("V1", Vector3::zeros(), Vector3::new(10.0, 0.0, 0.0))
                    .with_last_update(Duration::ZERO),
            )
            .unwrap();
        registry
            .register(
                VesselState::new(
                    "V2",
                    Vector3::new(100.0, 0.0, 0.0),
                    Vector3::new(-10.0, 0.0, 0.0),
                )
                .with_last_update(Duration::ZERO),
            )
            .unwrap();
    }

    #[test]
    fn test_overlapping_pair_emits_current_high_on_first_cycle() {
        let registry = TrackRegistry::shared();
        registry
            .register(
                VesselState::new("A", Vector3::zeros(), Vector3::zeros())
                    .with_last_update(Duration::ZERO),
            )
            .unwrap();
        registry
            .register(
                VesselState::new("B", Vector3::new(10.0, 0.0, 0.0), Vector3::zeros())
                    .with_last_update(Duration::ZERO),
            )
            .unwrap();

        let (detector, mut rx) = detector_with(Arc::clone(&registry), RunConfig::default());
        let outcome = detector.run_cycle(Duration::ZERO).unwrap();
        assert_eq!(outcome.current, 1);

        let event = rx.try_recv().unwrap();
        match event {
            ConflictEvent::Current {
                elapsed,
                distance,
                threat,
                ..
            } => {
                assert_eq!(elapsed, Duration::ZERO);
                assert_relative_eq!(distance, 10.0, epsilon = 1e-9);
                assert_eq!(threat, ThreatLevel::High);
            }
            other => panic!("expected current conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_head_on_pair_predicted_past_closing_point() {
        let registry = TrackRegistry::shared();
        head_on_pair(&registry);

        let config = RunConfig {
            prediction_interval: Duration::from_secs(2),
            ..RunConfig::default()
        };
        let (detector, mut rx) = detector_with(Arc::clone(&registry), config);

        let outcome = detector.run_cycle(Duration::ZERO).unwrap();
        assert_eq!(outcome.current, 0);
        assert_eq!(outcome.predicted, 1);

        match rx.try_recv().unwrap() {
            ConflictEvent::Predicted {
                horizon,
                distance,
                threat,
                ..
            } => {
                // At t = 2 s: positions 20 and 80, separation 60 < 80
                assert_eq!(horizon, Duration::from_secs(2));
                assert_relative_eq!(distance, 60.0, epsilon = 1e-9);
                assert_eq!(threat, ThreatLevel::High);
            }
            other => panic!("expected predicted conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_head_on_pair_no_prediction_at_exact_closing_point() {
        // At t = 1 s separation equals the combined radius exactly; the
        // predicate is strict, so no conflict yet.
        let registry = TrackRegistry::shared();
        head_on_pair(&registry);

        let config = RunConfig {
            prediction_interval: Duration::from_secs(1),
            ..RunConfig::default()
        };
        let (detector, _rx) = detector_with(Arc::clone(&registry), config);

        let outcome = detector.run_cycle(Duration::ZERO).unwrap();
        assert_eq!(outcome.predicted, 0);
    }

    #[test]
    fn test_pair_enumeration_is_exhaustive_without_duplicates() {
        let registry = TrackRegistry::shared();
        for (id, x) in [("A", 0.0), ("B", 5.0), ("C", 10.0)] {
            registry
                .register(
                    VesselState::new(id, Vector3::new(x, 0.0, 0.0), Vector3::zeros())
                        .with_last_update(Duration::ZERO),
                )
                .unwrap();
        }

        let (detector, mut rx) = detector_with(Arc::clone(&registry), RunConfig::default());
        let outcome = detector.run_cycle(Duration::ZERO).unwrap();

        // Three vessels in one cluster: exactly C(3,2) = 3 current events
        assert_eq!(outcome.current, 3);

        let mut pairs = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if !event.is_predicted() {
                let (a, b) = event.pair();
                assert_ne!(a, b);
                pairs.push((a.clone(), b.clone()));
            }
        }
        pairs.sort();
        pairs.dedup();
        assert_eq!(pairs.len(), 3);
    }

    #[test]
    fn test_untracked_vessels_excluded() {
        let registry = TrackRegistry::shared();
        registry
            .register(
                VesselState::new("tracked", Vector3::zeros(), Vector3::zeros())
                    .with_last_update(Duration::ZERO),
            )
            .unwrap();
        // Overlapping but never updated: must not appear in any check
        registry
            .register(VesselState::new(
                "untracked",
                Vector3::new(1.0, 0.0, 0.0),
                Vector3::zeros(),
            ))
            .unwrap();

        let (detector, _rx) = detector_with(Arc::clone(&registry), RunConfig::default());
        let outcome = detector.run_cycle(Duration::ZERO).unwrap();

        assert_eq!(outcome, CycleOutcome::default());
    }

    #[test]
    fn test_closed_sink_surfaces_error() {
        let registry = TrackRegistry::shared();
        registry
            .register(
                VesselState::new("A", Vector3::zeros(), Vector3::zeros())
                    .with_last_update(Duration::ZERO),
            )
            .unwrap();
        registry
            .register(
                VesselState::new("B", Vector3::new(1.0, 0.0, 0.0), Vector3::zeros())
                    .with_last_update(Duration::ZERO),
            )
            .unwrap();

        let (detector, rx) = detector_with(Arc::clone(&registry), RunConfig::default());
        drop(rx);

        let err = detector.run_cycle(Duration::ZERO).unwrap_err();
        assert_eq!(err, DetectorError::EventSinkClosed);
    }

    #[tokio::test]
    async fn test_run_requests_shutdown_when_duration_elapses() {
        let registry = TrackRegistry::shared();
        let ctx = ManualContext::shared();
        let (tx, _rx) = mpsc::unbounded_channel();

        let config = RunConfig {
            update_interval: Duration::from_secs(1),
            run_duration: Some(Duration::from_secs(3)),
            ..RunConfig::default()
        };
        let detector = ConflictDetector::new(Arc::clone(&ctx), registry, &config, tx);

        let shutdown = ShutdownSignal::new();
        detector.run(shutdown.clone()).await.unwrap();

        assert!(shutdown.is_requested());
        assert!(ctx.now() >= Duration::from_secs(3));
    }
}
