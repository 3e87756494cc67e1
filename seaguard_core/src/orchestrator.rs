//! Run lifecycle: spawning, supervising and joining the periodic tasks.

use crate::conflict::{ConflictDetector, DetectorError};
use crate::registry::TrackRegistry;
use crate::scheduler::RefreshScheduler;
use crate::shutdown::ShutdownSignal;
use crate::vessel::ConflictEvent;
use seaguard_env::SeaguardContext;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info};

/// Configuration for a simulation run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Seconds between refresh/detection cycles
    pub update_interval: Duration,

    /// Lookahead horizon for predicted-conflict checks
    pub prediction_interval: Duration,

    /// Total run length; `None` runs until externally cancelled
    pub run_duration: Option<Duration>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            update_interval: Duration::from_secs(1),
            prediction_interval: Duration::from_secs(1),
            run_duration: None,
        }
    }
}

impl RunConfig {
    /// Sets the run duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.run_duration = Some(duration);
        self
    }
}

/// Lifecycle of one orchestrated run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Created, nothing spawned yet
    Idle,
    /// Both periodic tasks live
    Running,
    /// Shutdown requested, waiting for tasks to confirm exit
    Stopping,
    /// Terminal: every spawned task has been joined
    Stopped,
}

/// Starts and supervises the refresh and detection tasks for one run.
///
/// Both tasks share one registry and one shutdown signal. The run ends
/// when the configured duration elapses, when an external cancellation
/// arrives through [`shutdown_handle`](Self::shutdown_handle), or when a
/// task faults - in which case the remaining task is stopped too rather
/// than leaving a half-running system. `Stopped` is declared only after
/// both tasks have been joined.
pub struct SimulationOrchestrator<C> {
    ctx: Arc<C>,
    registry: Arc<TrackRegistry>,
    config: RunConfig,
    state: Mutex<RunState>,
    shutdown: ShutdownSignal,
}

impl<C: SeaguardContext> SimulationOrchestrator<C> {
    /// Creates an idle orchestrator over a shared registry.
    pub fn new(ctx: Arc<C>, registry: Arc<TrackRegistry>, config: RunConfig) -> Self {
        Self {
            ctx,
            registry,
            config,
            state: Mutex::new(RunState::Idle),
            shutdown: ShutdownSignal::new(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunState {
        *self.state.lock().unwrap()
    }

    /// A handle external collaborators can use to cancel the run.
    pub fn shutdown_handle(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    fn transition(&self, to: RunState) {
        *self.state.lock().unwrap() = to;
    }

    /// Runs to completion, emitting conflicts into `events`.
    ///
    /// Resolves once both tasks have exited; the orchestrator is `Stopped`
    /// afterwards and cannot be run again.
    pub async fn run(
        &self,
        events: mpsc::UnboundedSender<ConflictEvent>,
    ) -> Result<(), OrchestratorError> {
        {
            let mut state = self.state.lock().unwrap();
            if *state != RunState::Idle {
                return Err(OrchestratorError::NotIdle(*state));
            }
            *state = RunState::Running;
        }

        info!(
            vessels = self.registry.len(),
            interval_secs = self.config.update_interval.as_secs_f64(),
            lookahead_secs = self.config.prediction_interval.as_secs_f64(),
            "starting simulation run"
        );

        let scheduler = RefreshScheduler::new(
            Arc::clone(&self.ctx),
            Arc::clone(&self.registry),
            self.config.update_interval,
        );
        let detector = ConflictDetector::new(
            Arc::clone(&self.ctx),
            Arc::clone(&self.registry),
            &self.config,
            events,
        );

        let mut refresh_handle: JoinHandle<()> = tokio::spawn(scheduler.run(self.shutdown.clone()));
        let mut detect_handle: JoinHandle<Result<(), DetectorError>> =
            tokio::spawn(detector.run(self.shutdown.clone()));

        // First exit (or an external stop request) starts the shutdown of
        // everything else.
        let mut refresh_joined: Option<Result<(), JoinError>> = None;
        let mut detect_joined: Option<Result<Result<(), DetectorError>, JoinError>> = None;
        tokio::select! {
            result = &mut refresh_handle => refresh_joined = Some(result),
            result = &mut detect_handle => detect_joined = Some(result),
            _ = self.shutdown.wait() => {}
        }

        self.transition(RunState::Stopping);
        self.shutdown.request();

        let refresh_joined = match refresh_joined {
            Some(result) => result,
            None => refresh_handle.await,
        };
        let detect_joined = match detect_joined {
            Some(result) => result,
            None => detect_handle.await,
        };

        self.transition(RunState::Stopped);

        let refresh_outcome = refresh_joined.map_err(|join_err| {
            error!(error = %join_err, "refresh scheduler task failed");
            OrchestratorError::TaskFailure {
                task: "refresh-scheduler",
                reason: join_err.to_string(),
            }
        });
        let detect_outcome = match detect_joined {
            Ok(Ok(())) => Ok(()),
            Ok(Err(detector_err)) => {
                error!(error = %detector_err, "conflict detector task failed");
                Err(OrchestratorError::TaskFailure {
                    task: "conflict-detector",
                    reason: detector_err.to_string(),
                })
            }
            Err(join_err) => {
                error!(error = %join_err, "conflict detector task failed");
                Err(OrchestratorError::TaskFailure {
                    task: "conflict-detector",
                    reason: join_err.to_string(),
                })
            }
        };

        let outcome = detect_outcome.and(refresh_outcome);
        info!(ok = outcome.is_ok(), "simulation run stopped");
        outcome
    }
}

/// Errors that can occur while orchestrating a run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrchestratorError {
    /// `run` called on an orchestrator that already ran (or is running).
    #[error("orchestrator is {0:?}, not idle")]
    NotIdle(RunState),

    /// A periodic task faulted; the run was stopped.
    #[error("task '{task}' failed: {reason}")]
    TaskFailure { task: &'static str, reason: String },
}
