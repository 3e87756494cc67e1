//! The "Motion" Engine - constant-velocity kinematics.
//!
//! Pure functions over vessel records: separation, linear extrapolation and
//! the collision/threat predicates. Nothing in here touches shared state or
//! a clock, which is what keeps the conflict logic testable in isolation.

use crate::vessel::{ThreatLevel, VesselId, VesselState};
use nalgebra::Vector3;
use std::time::Duration;

/// Euclidean separation between two points, in meters.
pub fn distance(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    (a - b).norm()
}

/// Extrapolates a vessel's position to `future_time` assuming constant
/// velocity.
///
/// Valid for targets before *or* after the vessel's last update; the
/// elapsed term is signed, so this extrapolates backwards just as readily
/// as forwards. Fails with [`KinematicsError::PrecursorMissing`] for a
/// vessel that has never been updated - there is no anchor to extrapolate
/// from.
pub fn predict_position(
    vessel: &VesselState,
    future_time: Duration,
) -> Result<Vector3<f64>, KinematicsError> {
    let last_update = vessel
        .last_update
        .ok_or_else(|| KinematicsError::PrecursorMissing(vessel.id.clone()))?;

    let elapsed_secs = future_time.as_secs_f64() - last_update.as_secs_f64();
    Ok(vessel.position + vessel.velocity * elapsed_secs)
}

/// Whether two vessels' safezones currently overlap.
///
/// The predicate compares separation against the *sum* of both radii, so it
/// is symmetric under swapping the arguments.
pub fn is_colliding(v1: &VesselState, v2: &VesselState) -> bool {
    distance(&v1.position, &v2.position) < v1.safezone_radius + v2.safezone_radius
}

/// Classifies the threat between two vessels at their present positions.
///
/// See [`ThreatLevel::classify`] for the banding; predicted conflicts
/// classify on extrapolated positions via that function directly.
pub fn classify_threat(v1: &VesselState, v2: &VesselState) -> ThreatLevel {
    let separation = distance(&v1.position, &v2.position);
    ThreatLevel::classify(separation, v1.safezone_radius + v2.safezone_radius)
}

/// Errors that can occur during kinematic evaluation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KinematicsError {
    /// Extrapolation requested for a vessel that was never updated.
    ///
    /// Routine during warm-up: callers skip the vessel for the cycle.
    #[error("vessel {0} has no update history to extrapolate from")]
    PrecursorMissing(VesselId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tracked(id: &str, position: [f64; 3], velocity: [f64; 3], at_secs: u64) -> VesselState {
        VesselState::new(id, Vector3::from(position), Vector3::from(velocity))
            .with_last_update(Duration::from_secs(at_secs))
    }

    #[test]
    fn test_distance() {
        let a = Vector3::new(0.0, 0.0, 0.0);
        let b = Vector3::new(3.0, 4.0, 0.0);
        assert_relative_eq!(distance(&a, &b), 5.0, epsilon = 1e-12);
        assert_relative_eq!(distance(&b, &a), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_predict_at_last_update_is_identity() {
        let vessel = tracked("V1", [10.0, -5.0, 2.0], [3.0, 1.0, 0.0], 7);

        let predicted = predict_position(&vessel, Duration::from_secs(7)).unwrap();
        assert_relative_eq!(predicted.x, 10.0, epsilon = 1e-12);
        assert_relative_eq!(predicted.y, -5.0, epsilon = 1e-12);
        assert_relative_eq!(predicted.z, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_predict_forward() {
        let vessel = tracked("V1", [0.0, 0.0, 0.0], [10.0, 0.0, 0.0], 0);

        let predicted = predict_position(&vessel, Duration::from_secs(3)).unwrap();
        assert_relative_eq!(predicted.x, 30.0, epsilon = 1e-9);
    }

    #[test]
    fn test_predict_backward() {
        // Extrapolation, not interpolation: targets before the anchor work
        let vessel = tracked("V1", [100.0, 0.0, 0.0], [10.0, 0.0, 0.0], 10);

        let predicted = predict_position(&vessel, Duration::from_secs(8)).unwrap();
        assert_relative_eq!(predicted.x, 80.0, epsilon = 1e-9);
    }

    #[test]
    fn test_predict_untracked_vessel_fails() {
        let vessel = VesselState::new("V1", Vector3::zeros(), Vector3::zeros());

        let err = predict_position(&vessel, Duration::from_secs(1)).unwrap_err();
        assert_eq!(err, KinematicsError::PrecursorMissing(VesselId::from("V1")));
    }

    #[test]
    fn test_collision_uses_sum_of_radii() {
        // Radii 10 + 30: overlap below separation 40 regardless of order
        let small = tracked("S", [0.0, 0.0, 0.0], [0.0; 3], 0).with_safezone(10.0);
        let large = tracked("L", [39.0, 0.0, 0.0], [0.0; 3], 0).with_safezone(30.0);

        assert!(is_colliding(&small, &large));
        assert!(is_colliding(&large, &small));

        let far = tracked("F", [41.0, 0.0, 0.0], [0.0; 3], 0).with_safezone(30.0);
        assert!(!is_colliding(&small, &far));
        assert!(!is_colliding(&far, &small));
    }

    #[test]
    fn test_threat_boundaries() {
        let eps = 1e-9;
        let at = |x: f64| tracked("X", [x, 0.0, 0.0], [0.0; 3], 0).with_safezone(40.0);
        let origin = tracked("O", [0.0, 0.0, 0.0], [0.0; 3], 0).with_safezone(40.0);

        // Combined radius R = 80
        assert_eq!(classify_threat(&origin, &at(80.0 - eps)), ThreatLevel::High);
        assert_eq!(classify_threat(&origin, &at(80.0)), ThreatLevel::Medium);
        assert_eq!(classify_threat(&origin, &at(160.0 - eps)), ThreatLevel::Medium);
        assert_eq!(classify_threat(&origin, &at(160.0)), ThreatLevel::Low);
    }

    #[test]
    fn test_threat_symmetry_with_unequal_radii() {
        let a = tracked("A", [0.0, 0.0, 0.0], [0.0; 3], 0).with_safezone(5.0);
        let b = tracked("B", [70.0, 0.0, 0.0], [0.0; 3], 0).with_safezone(60.0);

        assert_eq!(classify_threat(&a, &b), classify_threat(&b, &a));
        assert_eq!(classify_threat(&a, &b), ThreatLevel::High);
    }
}
