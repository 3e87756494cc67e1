//! The "Tracking" Engine - synchronized vessel registry.
//!
//! [`TrackRegistry`] owns the live vessel set and is the *only* place
//! shared vessel state is mutated. Readers take value-copy snapshots,
//! writers replace whole records under the write lock, and no lock is ever
//! held across an await point, so every operation is linearizable and a
//! snapshot can never observe a half-written vessel.

use crate::vessel::{VesselId, VesselState};
use nalgebra::Vector3;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Synchronized registry of tracked vessels.
///
/// Keyed by vessel id; the ordered map gives `snapshot()` a stable,
/// deterministic ordering across cycles.
pub struct TrackRegistry {
    vessels: RwLock<BTreeMap<VesselId, VesselState>>,
}

impl TrackRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            vessels: RwLock::new(BTreeMap::new()),
        }
    }

    /// Creates an Arc-wrapped registry for sharing across tasks.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Adds a vessel to the registry.
    ///
    /// Rejects duplicate ids and non-positive safezone radii; the registry
    /// is unchanged on error.
    pub fn register(&self, vessel: VesselState) -> Result<(), RegistryError> {
        if vessel.safezone_radius <= 0.0 {
            return Err(RegistryError::InvalidSafezone {
                id: vessel.id.clone(),
                radius: vessel.safezone_radius,
            });
        }

        let mut vessels = self.vessels.write().unwrap();
        if vessels.contains_key(&vessel.id) {
            return Err(RegistryError::DuplicateVessel(vessel.id));
        }
        vessels.insert(vessel.id.clone(), vessel);
        Ok(())
    }

    /// Removes a vessel, returning its final state.
    pub fn deregister(&self, id: &VesselId) -> Result<VesselState, RegistryError> {
        let mut vessels = self.vessels.write().unwrap();
        vessels
            .remove(id)
            .ok_or_else(|| RegistryError::UnknownVessel(id.clone()))
    }

    /// Atomically replaces a vessel's position, velocity and update time.
    ///
    /// The timestamp must not precede the vessel's recorded last update;
    /// a stale write is rejected with [`RegistryError::TimeRegression`]
    /// and the record is left untouched.
    pub fn update(
        &self,
        id: &VesselId,
        position: Vector3<f64>,
        velocity: Vector3<f64>,
        timestamp: Duration,
    ) -> Result<(), RegistryError> {
        let mut vessels = self.vessels.write().unwrap();
        let vessel = vessels
            .get_mut(id)
            .ok_or_else(|| RegistryError::UnknownVessel(id.clone()))?;

        if let Some(last_update) = vessel.last_update {
            if timestamp < last_update {
                return Err(RegistryError::TimeRegression {
                    id: id.clone(),
                    current: last_update,
                    attempted: timestamp,
                });
            }
        }

        vessel.position = position;
        vessel.velocity = velocity;
        vessel.last_update = Some(timestamp);
        Ok(())
    }

    /// Returns a consistent point-in-time copy of every vessel, ordered
    /// by id.
    pub fn snapshot(&self) -> Vec<VesselState> {
        let vessels = self.vessels.read().unwrap();
        vessels.values().cloned().collect()
    }

    /// Returns a copy of one vessel's current state.
    pub fn get(&self, id: &VesselId) -> Option<VesselState> {
        let vessels = self.vessels.read().unwrap();
        vessels.get(id).cloned()
    }

    /// Number of registered vessels.
    pub fn len(&self) -> usize {
        self.vessels.read().unwrap().len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.vessels.read().unwrap().is_empty()
    }
}

impl Default for TrackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur during registry operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    /// Operation referenced an id that is not registered.
    #[error("unknown vessel: {0}")]
    UnknownVessel(VesselId),

    /// A vessel with this id is already live.
    #[error("vessel already registered: {0}")]
    DuplicateVessel(VesselId),

    /// Update timestamp precedes the vessel's recorded last update.
    #[error("time regression for vessel {id}: {attempted:?} < {current:?}")]
    TimeRegression {
        id: VesselId,
        current: Duration,
        attempted: Duration,
    },

    /// Safezone radius must be strictly positive.
    #[error("invalid safezone radius {radius} for vessel {id}")]
    InvalidSafezone { id: VesselId, radius: f64 },
}
