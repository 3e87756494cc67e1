//! Seaguard Simulation Harness
//!
//! This crate drives the tracking core end-to-end: it bootstraps a named
//! scenario into a [`TrackRegistry`](seaguard_core::TrackRegistry), runs
//! the orchestrated refresh/detection tasks against it, optionally layers
//! a noisy external sensor feed on top, and consumes the resulting
//! conflict-event stream through a logging sink.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                      ScenarioRunner                       │
//! │                                                           │
//! │  scenario ──► TrackRegistry ◄────── SensorFeed (optional) │
//! │                    ▲    ▲                                 │
//! │          ┌─────────┘    └─────────┐                       │
//! │  RefreshScheduler          ConflictDetector               │
//! │   (dead-reckoning)           (pair sweeps)                │
//! │                                   │                       │
//! │                                   ▼                       │
//! │                        events ─► EventSink ─► tracing     │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! The core makes no assumption about this harness; any consumer can poll
//! registry snapshots and drain the event channel at its own cadence.

mod feed;
mod runner;
pub mod scenarios;
mod sink;

pub use feed::SensorFeed;
pub use runner::{RunnerError, ScenarioReport, ScenarioRunner};
pub use scenarios::ScenarioId;
pub use sink::{EventSink, SinkStats};
