//! Role-addressed runtime for compiled Tempo choreographies
//!
//! A choreography is written once, naming several roles, and compiled into
//! one process function per role. Each process receives an [`Env`] and
//! communicates only through it: the environment resolves the function's
//! static role names to the concrete roles of the current call and hands the
//! exchange to a [`Transport`].
//!
//! The [`simulator`] runs all role processes of a program together over an
//! in-memory queue and returns the ordered [`Trace`] of sends and returns.
//!
//! ```no_run
//! use tempo_runtime::{Simulation, Value};
//!
//! # async fn demo() -> tempo_runtime::Result<()> {
//! let trace = Simulation::default()
//!     .role("A", |env| async move {
//!         env.send(10, &["B"]).await?;
//!         Ok(None)
//!     })
//!     .role("B", |env| async move {
//!         let x: i64 = env.recv_as("A").await?;
//!         Ok(Some(Value::Int(x)))
//!     })
//!     .run()
//!     .await?;
//! println!("{trace}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod env;
pub mod error;
pub mod simulator;
pub mod trace;
pub mod transport;
pub mod value;

// Re-export main APIs
pub use config::{FailurePolicy, Scheduler, SimulationConfig};
pub use env::Env;
pub use error::{Result, SimulationError};
pub use simulator::{process, run_simulation, Outcome, Process, ProcessResult, Processes, Simulation};
pub use trace::{Event, EventLog, Trace};
pub use transport::{LocalQueue, QueueTransport, Tracer, Transport};
pub use value::{RoleName, Value};
