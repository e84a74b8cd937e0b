//! Simulation configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How role processes are scheduled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scheduler {
    /// All role processes are polled on the calling task in role-name order.
    ///
    /// Interleavings only depend on the program, so traces are reproducible
    /// from run to run. Without a timeout this works on any executor.
    #[default]
    Cooperative,
    /// Each role process runs as its own task on the ambient tokio runtime.
    ///
    /// Only causality orders the trace; independent sends may be recorded in
    /// either order. Requires a runtime to be entered; outside one the run
    /// fails with [`SimulationError::RuntimeUnavailable`].
    ///
    /// [`SimulationError::RuntimeUnavailable`]: crate::SimulationError::RuntimeUnavailable
    Parallel,
}

/// What happens to recorded events when a run fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Failed runs report no events.
    #[default]
    Discard,
    /// Failed runs keep the events recorded before the failure.
    KeepPartial,
}

/// Settings for one simulation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Task scheduling strategy.
    pub scheduler: Scheduler,
    /// Upper bound on the whole run. `None` waits forever, which means a
    /// deadlocked protocol never returns.
    pub timeout: Option<Duration>,
    /// Handling of events recorded by a failed run.
    pub failure_policy: FailurePolicy,
}

impl SimulationConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the given scheduler.
    pub fn with_scheduler(mut self, scheduler: Scheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Fail runs that take longer than `timeout`.
    ///
    /// The limit is enforced with tokio's timer, so the run must be polled
    /// inside a tokio runtime with time enabled. Outside any runtime the run
    /// fails with [`SimulationError::RuntimeUnavailable`].
    ///
    /// [`SimulationError::RuntimeUnavailable`]: crate::SimulationError::RuntimeUnavailable
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Use the given failure policy.
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}
