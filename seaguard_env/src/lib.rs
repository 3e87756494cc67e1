//! Seaguard Environment Abstraction Layer
//!
//! This crate provides the "Sans-IO" abstraction allowing the Seaguard
//! engines to run against both **Production** time (tokio) and
//! **Simulation** time (a manually advanced virtual clock).
//!
//! # Core Concept
//!
//! The tracking core never reads the wall clock directly. All time comes
//! through [`SeaguardContext`], so the same periodic loops that pace
//! themselves with `tokio::time::sleep` in production can be driven
//! tick-by-tick in tests, with no real sleeps and fully reproducible
//! timestamps.
//!
//! # Example
//!
//! ```ignore
//! use seaguard_env::SeaguardContext;
//! use std::time::Duration;
//!
//! async fn refresh_loop<Ctx: SeaguardContext>(ctx: &Ctx) {
//!     loop {
//!         let now = ctx.now();
//!         advance_tracks(now);
//!         ctx.sleep(Duration::from_secs(1)).await;
//!     }
//! }
//! ```

mod context;
mod manual;
mod tokio_impl;

pub use context::SeaguardContext;
pub use manual::ManualContext;
pub use tokio_impl::TokioContext;
