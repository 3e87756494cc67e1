//! Logging sink for the conflict-event stream.
//!
//! The core only emits structured [`ConflictEvent`]s; turning them into
//! operator-readable text is this sink's job. It also keeps the running
//! totals the scenario report is built from.

use seaguard_core::{ConflictEvent, ThreatLevel};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Aggregate statistics for one drained event stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct SinkStats {
    /// Current conflicts observed
    pub current: usize,

    /// Predicted conflicts observed
    pub predicted: usize,

    /// Most severe threat seen across all events
    pub highest_threat: Option<ThreatLevel>,
}

impl SinkStats {
    fn record(&mut self, event: &ConflictEvent) {
        if event.is_predicted() {
            self.predicted += 1;
        } else {
            self.current += 1;
        }

        let threat = event.threat();
        let more_severe = match self.highest_threat {
            None => true,
            Some(ThreatLevel::High) => false,
            Some(ThreatLevel::Medium) => threat == ThreatLevel::High,
            Some(ThreatLevel::Low) => threat != ThreatLevel::Low,
        };
        if more_severe {
            self.highest_threat = Some(threat);
        }
    }
}

/// Consumes conflict events and renders them through `tracing`.
pub struct EventSink {
    rx: mpsc::UnboundedReceiver<ConflictEvent>,
}

impl EventSink {
    /// Wraps an event receiver.
    pub fn new(rx: mpsc::UnboundedReceiver<ConflictEvent>) -> Self {
        Self { rx }
    }

    /// Drains events until every sender is gone, then returns the totals.
    pub async fn run(mut self) -> SinkStats {
        let mut stats = SinkStats::default();

        while let Some(event) = self.rx.recv().await {
            stats.record(&event);
            Self::report(&event);
        }

        stats
    }

    fn report(event: &ConflictEvent) {
        match event {
            ConflictEvent::Current {
                first,
                second,
                elapsed,
                distance,
                threat,
            } => {
                warn!(
                    "Collision between {} and {} at t={:.2}s (separation {:.1}m). Threat level: {}",
                    first,
                    second,
                    elapsed.as_secs_f64(),
                    distance,
                    threat
                );
            }
            ConflictEvent::Predicted {
                first,
                second,
                horizon,
                distance,
                threat,
            } => {
                info!(
                    "Potential future collision between {} and {} at t={:.2}s (separation {:.1}m). Threat level: {}",
                    first,
                    second,
                    horizon.as_secs_f64(),
                    distance,
                    threat
                );
            }
        }
    }
}
