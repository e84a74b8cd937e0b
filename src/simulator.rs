//! Simulation harness.
//!
//! Runs one process per role against a shared in-memory queue, wiring each
//! role through a [`Tracer`] so that every send lands in a shared event
//! log, and reports the log once every role has returned.
//!
//! Scheduling is selected through [`SimulationConfig`]. The default
//! cooperative scheduler polls all roles on the calling task, which keeps
//! traces reproducible; the parallel scheduler spawns one tokio task per
//! role. Either way a run without a timeout hangs if some receive is never
//! satisfied, so tests of untrusted protocols should set one.

use futures::future::{self, BoxFuture};
use futures::FutureExt;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio::runtime::Handle;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use crate::config::{FailurePolicy, Scheduler, SimulationConfig};
use crate::env::Env;
use crate::error::{Result, SimulationError};
use crate::trace::{Event, EventLog, Trace};
use crate::transport::{LocalQueue, Tracer};
use crate::value::{RoleName, Value};

/// Result of a process function: an optional return value.
pub type ProcessResult = anyhow::Result<Option<Value>>;

/// A compiled process function for one role.
pub struct Process(Box<dyn FnOnce(Env) -> BoxFuture<'static, ProcessResult> + Send>);

impl Process {
    /// Wrap an async function taking the role's environment.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: FnOnce(Env) -> Fut + Send + 'static,
        Fut: Future<Output = ProcessResult> + Send + 'static,
    {
        Self(Box::new(move |env| f(env).boxed()))
    }

    fn call(self, env: Env) -> BoxFuture<'static, ProcessResult> {
        (self.0)(env)
    }
}

impl fmt::Debug for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Process(..)")
    }
}

/// Shorthand for [`Process::new`].
pub fn process<F, Fut>(f: F) -> Process
where
    F: FnOnce(Env) -> Fut + Send + 'static,
    Fut: Future<Output = ProcessResult> + Send + 'static,
{
    Process::new(f)
}

/// Role processes participating in a run, keyed by role.
pub type Processes = BTreeMap<RoleName, Process>;

/// Full result of a run, including events recorded before a failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Recorded events. Empty for failed runs under [`FailurePolicy::Discard`].
    pub trace: Trace,
    /// Why the run failed, if it did.
    pub error: Option<SimulationError>,
}

impl Outcome {
    /// Whether every role completed.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// The trace of a successful run, or the failure.
    pub fn into_result(self) -> Result<Trace> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.trace),
        }
    }
}

/// A configured simulation run.
#[derive(Debug, Default)]
pub struct Simulation {
    processes: Processes,
    config: SimulationConfig,
}

impl Simulation {
    /// Simulation of `processes` with the default configuration.
    pub fn new(processes: Processes) -> Self {
        Self {
            processes,
            config: SimulationConfig::default(),
        }
    }

    /// Register the process for `role`, replacing any earlier one.
    pub fn role<F, Fut>(mut self, role: impl Into<RoleName>, f: F) -> Self
    where
        F: FnOnce(Env) -> Fut + Send + 'static,
        Fut: Future<Output = ProcessResult> + Send + 'static,
    {
        self.processes.insert(role.into(), Process::new(f));
        self
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: SimulationConfig) -> Self {
        self.config = config;
        self
    }

    /// Current configuration.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Participating roles.
    pub fn roles(&self) -> impl Iterator<Item = &RoleName> {
        self.processes.keys()
    }

    /// Run all roles to completion and return the trace.
    ///
    /// A failed run reports only the error; see [`Simulation::run_outcome`]
    /// for access to the partial trace.
    pub async fn run(self) -> Result<Trace> {
        self.run_outcome().await.into_result()
    }

    /// Run all roles to completion, reporting failures alongside the events
    /// recorded so far (subject to the configured [`FailurePolicy`]).
    #[instrument(skip_all, fields(roles = self.processes.len(), scheduler = ?self.config.scheduler))]
    pub async fn run_outcome(self) -> Outcome {
        let Simulation { processes, config } = self;
        if processes.is_empty() {
            warn!("simulation has no participants");
            return Outcome {
                trace: Trace::default(),
                error: Some(SimulationError::NoParticipants),
            };
        }

        if let Err(err) = check_runtime(&config) {
            return fail(&config, &EventLog::new(), err);
        }

        let log = EventLog::new();
        let queue = LocalQueue::new(processes.keys().cloned());
        info!(roles = ?queue.roles().collect::<Vec<_>>(), "simulation: start");

        let mut tasks = Vec::with_capacity(processes.len());
        for (role, process) in processes {
            let transport = queue.transport(role.clone());
            let env = Env::new(Tracer::new(transport, role.clone(), log.clone()));
            tasks.push(role_task(role, process, env, log.clone()));
        }

        let run = match config.scheduler {
            Scheduler::Cooperative => run_cooperative(tasks).boxed(),
            Scheduler::Parallel => run_parallel(tasks).boxed(),
        };
        let result = match config.timeout {
            Some(limit) => tokio::time::timeout(limit, run)
                .await
                .unwrap_or(Err(SimulationError::Timeout(limit))),
            None => run.await,
        };

        match result {
            Ok(()) => {
                let pending = queue.pending();
                if pending > 0 {
                    warn!(pending, "simulation: messages left undelivered");
                }
                let trace = log.take();
                info!(events = trace.len(), "simulation: finished");
                Outcome { trace, error: None }
            }
            Err(err) => fail(&config, &log, err),
        }
    }
}

/// Run `processes` with the default configuration.
pub async fn run_simulation(processes: Processes) -> Result<Trace> {
    Simulation::new(processes).run().await
}

/// Timeouts and spawned tasks panic outside a tokio runtime; report that as
/// an error before any process starts.
fn check_runtime(config: &SimulationConfig) -> Result<()> {
    let needs = match (config.timeout, config.scheduler) {
        (Some(_), _) => "a run timeout",
        (None, Scheduler::Parallel) => "the parallel scheduler",
        (None, Scheduler::Cooperative) => return Ok(()),
    };
    Handle::try_current()
        .map(|_| ())
        .map_err(|e| SimulationError::RuntimeUnavailable(format!("{needs} requires one: {e}")))
}

fn fail(config: &SimulationConfig, log: &EventLog, err: SimulationError) -> Outcome {
    warn!(error = %err, "simulation: failed");
    let trace = match config.failure_policy {
        FailurePolicy::Discard => Trace::default(),
        FailurePolicy::KeepPartial => log.take(),
    };
    Outcome {
        trace,
        error: Some(err),
    }
}

async fn role_task(role: RoleName, process: Process, env: Env, log: EventLog) -> Result<()> {
    debug!(%role, "process: start");
    let outcome = AssertUnwindSafe(process.call(env)).catch_unwind().await;
    match outcome {
        Ok(Ok(value)) => {
            debug!(%role, ?value, "process: returned");
            log.push(Event::Return { role, value });
            Ok(())
        }
        Ok(Err(err)) => {
            let err = SimulationError::from_process(&role, err);
            warn!(%role, error = %err, "process: failed");
            Err(err)
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            warn!(%role, %message, "process: panicked");
            Err(SimulationError::ProcessFailure { role, message })
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

/// Poll every role on the current task; stops at the first failure.
async fn run_cooperative<F>(tasks: Vec<F>) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    future::try_join_all(tasks).await.map(|_| ())
}

/// Spawn every role as a tokio task; aborts the rest at the first failure.
async fn run_parallel<F>(tasks: Vec<F>) -> Result<()>
where
    F: Future<Output = Result<()>> + Send + 'static,
{
    let mut set = JoinSet::new();
    for task in tasks {
        set.spawn(task);
    }
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                set.abort_all();
                return Err(err);
            }
            // Panics are caught in `role_task`; this is runtime cancellation.
            Err(join_err) => {
                set.abort_all();
                return Err(SimulationError::Cancelled(join_err.to_string()));
            }
        }
    }
    Ok(())
}
