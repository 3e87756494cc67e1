//! Bootstrap scenarios for the simulation harness.

use nalgebra::Vector3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use seaguard_core::VesselState;
use serde::Serialize;

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioId {
    /// Two vessels on converging diagonal courses
    Crossing,

    /// Head-on approach closing at 20 m/s from 100 m apart
    HeadOn,

    /// Two vessels already inside each other's safezones
    Overlap,

    /// A line of vessels on parallel courses, safely separated
    Convoy,

    /// Seeded random traffic field
    Traffic,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::Crossing,
            ScenarioId::HeadOn,
            ScenarioId::Overlap,
            ScenarioId::Convoy,
            ScenarioId::Traffic,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::Crossing => "crossing",
            ScenarioId::HeadOn => "head_on",
            ScenarioId::Overlap => "overlap",
            ScenarioId::Convoy => "convoy",
            ScenarioId::Traffic => "traffic",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::Crossing => "Two vessels converging on diagonal courses, conflict near t=9s",
            ScenarioId::HeadOn => "Head-on pair closing at 20 m/s, safezones touch at t=1s",
            ScenarioId::Overlap => "Overlapping pair, immediate High-threat conflict",
            ScenarioId::Convoy => "Parallel convoy with safe separation, no conflicts expected",
            ScenarioId::Traffic => "Seeded random traffic field",
        }
    }

    /// Builds the initial vessel set for this scenario.
    ///
    /// Vessels come back with no update history; the runner activates them
    /// with an initial fix through the registry's update path. Only
    /// `Traffic` consumes the seed.
    pub fn build(&self, seed: u64) -> Vec<VesselState> {
        match self {
            ScenarioId::Crossing => vec![
                VesselState::new(
                    "0001",
                    Vector3::new(-50.0, -50.0, 0.0),
                    Vector3::new(0.0, 10.0, 0.0),
                ),
                VesselState::new(
                    "0002",
                    Vector3::new(100.0, 100.0, 0.0),
                    Vector3::new(-10.0, -10.0, 0.0),
                ),
            ],
            ScenarioId::HeadOn => vec![
                VesselState::new("V1", Vector3::zeros(), Vector3::new(10.0, 0.0, 0.0)),
                VesselState::new(
                    "V2",
                    Vector3::new(100.0, 0.0, 0.0),
                    Vector3::new(-10.0, 0.0, 0.0),
                ),
            ],
            ScenarioId::Overlap => vec![
                VesselState::new("A", Vector3::zeros(), Vector3::new(1.0, 0.0, 0.0)),
                VesselState::new(
                    "B",
                    Vector3::new(10.0, 0.0, 0.0),
                    Vector3::new(1.0, 0.0, 0.0),
                ),
            ],
            ScenarioId::Convoy => (0..4)
                .map(|i| {
                    VesselState::new(
                        format!("C{:02}", i),
                        Vector3::new(0.0, 200.0 * i as f64, 0.0),
                        Vector3::new(8.0, 0.0, 0.0),
                    )
                })
                .collect(),
            ScenarioId::Traffic => {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                (0..12)
                    .map(|i| {
                        let position = Vector3::new(
                            rng.gen_range(-500.0..500.0),
                            rng.gen_range(-500.0..500.0),
                            0.0,
                        );
                        let velocity = Vector3::new(
                            rng.gen_range(-15.0..15.0),
                            rng.gen_range(-15.0..15.0),
                            0.0,
                        );
                        VesselState::new(format!("T{:03}", i), position, velocity)
                    })
                    .collect()
            }
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "crossing" => Ok(ScenarioId::Crossing),
            "head_on" | "headon" => Ok(ScenarioId::HeadOn),
            "overlap" => Ok(ScenarioId::Overlap),
            "convoy" => Ok(ScenarioId::Convoy),
            "traffic" => Ok(ScenarioId::Traffic),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}
