//! Vessel state records and conflict event types.
//!
//! A [`VesselState`] is the single authoritative record for one tracked
//! vessel. There is no filtered estimate behind it: whatever the registry
//! holds *is* the vessel, and every consumer (refresh, detection,
//! rendering) works from value copies of these records.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Safezone radius assigned to vessels that do not specify one, in meters.
pub const DEFAULT_SAFEZONE_RADIUS: f64 = 40.0;

// ============================================================================
// VESSEL IDENTITY
// ============================================================================

/// Opaque unique vessel identifier.
///
/// Ids are assigned by the external bootstrap feed (call signs, MMSI-like
/// strings, anything unique) and are immutable for the lifetime of the
/// record. Uniqueness is enforced by the registry at registration.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VesselId(String);

impl VesselId {
    /// Creates a new id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VesselId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VesselId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for VesselId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ============================================================================
// VESSEL STATE
// ============================================================================

/// The authoritative kinematic record for one tracked vessel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VesselState {
    /// Unique identifier, immutable after registration
    pub id: VesselId,

    /// Position [x, y, z] in meters (world frame)
    pub position: Vector3<f64>,

    /// Velocity [vx, vy, vz] in m/s, assumed constant between updates
    pub velocity: Vector3<f64>,

    /// Exclusion radius around the vessel, in meters (always > 0)
    pub safezone_radius: f64,

    /// Monotonic timestamp of the most recent state write.
    ///
    /// `None` until the vessel's first update; such a vessel is "not yet
    /// tracked" and is excluded from extrapolation and conflict checks.
    pub last_update: Option<Duration>,
}

impl VesselState {
    /// Creates a new vessel with the default safezone radius and no update
    /// history.
    pub fn new(id: impl Into<VesselId>, position: Vector3<f64>, velocity: Vector3<f64>) -> Self {
        Self {
            id: id.into(),
            position,
            velocity,
            safezone_radius: DEFAULT_SAFEZONE_RADIUS,
            last_update: None,
        }
    }

    /// Sets the safezone radius.
    pub fn with_safezone(mut self, radius: f64) -> Self {
        self.safezone_radius = radius;
        self
    }

    /// Marks the vessel as updated at the given time.
    pub fn with_last_update(mut self, at: Duration) -> Self {
        self.last_update = Some(at);
        self
    }

    /// Whether the vessel has received its first update and participates
    /// in extrapolation and conflict evaluation.
    pub fn is_tracked(&self) -> bool {
        self.last_update.is_some()
    }
}

// ============================================================================
// THREAT CLASSIFICATION
// ============================================================================

/// Three-tier conflict severity, derived from the separation between two
/// vessels relative to their combined safezone radii.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThreatLevel {
    /// Separation below the combined safezone radii
    High,
    /// Separation within twice the combined safezone radii
    Medium,
    /// Anything farther
    Low,
}

impl ThreatLevel {
    /// Classifies a separation against a combined safezone radius.
    ///
    /// Boundaries are half-open on the lower bound: exactly `combined` is
    /// `Medium`, exactly `2 * combined` is `Low`.
    pub fn classify(distance: f64, combined_radius: f64) -> Self {
        if distance < combined_radius {
            Self::High
        } else if distance < 2.0 * combined_radius {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        };
        f.write_str(label)
    }
}

// ============================================================================
// CONFLICT EVENTS
// ============================================================================

/// A detected proximity conflict between two vessels.
///
/// Events are emitted by the conflict detector and consumed by an external
/// sink (logger, alerting pipeline, renderer); the core never formats them.
/// Time offsets are measured from simulation start.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConflictEvent {
    /// Safezone overlap at present positions.
    Current {
        first: VesselId,
        second: VesselId,
        /// Time since simulation start at which the overlap was observed
        elapsed: Duration,
        /// Separation the classification was made at, in meters
        distance: f64,
        threat: ThreatLevel,
    },
    /// Safezone overlap at positions extrapolated to a future lookahead.
    Predicted {
        first: VesselId,
        second: VesselId,
        /// Offset from simulation start of the predicted overlap
        horizon: Duration,
        /// Extrapolated separation, in meters
        distance: f64,
        threat: ThreatLevel,
    },
}

impl ConflictEvent {
    /// The pair of vessels involved.
    pub fn pair(&self) -> (&VesselId, &VesselId) {
        match self {
            Self::Current { first, second, .. } | Self::Predicted { first, second, .. } => {
                (first, second)
            }
        }
    }

    /// The severity classification.
    pub fn threat(&self) -> ThreatLevel {
        match self {
            Self::Current { threat, .. } | Self::Predicted { threat, .. } => *threat,
        }
    }

    /// Whether this conflict was found on extrapolated positions.
    pub fn is_predicted(&self) -> bool {
        matches!(self, Self::Predicted { .. })
    }
}
