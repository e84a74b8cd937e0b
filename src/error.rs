//! Error types for simulation runs.
//!
//! Compile-time failures of a choreography are reported by the compiler with
//! source positions; everything here happens after compilation succeeded and
//! therefore carries a message but no position.

use std::time::Duration;
use thiserror::Error;

use crate::value::RoleName;

/// Errors that can occur while running role processes.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SimulationError {
    /// The role to process mapping was empty.
    #[error("simulation has no participants")]
    NoParticipants,

    /// A send or receive named a role that does not take part in the run.
    #[error("transport misuse at role {role}: {reason}")]
    TransportMisuse {
        /// Role whose transport was misused.
        role: RoleName,
        /// What went wrong.
        reason: String,
    },

    /// A role's process function failed.
    #[error("process {role} failed: {message}")]
    ProcessFailure {
        /// The failing role.
        role: RoleName,
        /// Rendered error chain of the failure.
        message: String,
    },

    /// The run did not complete in time, usually because a receive was
    /// never satisfied.
    #[error("simulation timed out after {0:?} (deadlock?)")]
    Timeout(Duration),

    /// A flat substitution list did not consist of whole pairs.
    #[error("invalid role substitution: {0}")]
    InvalidSubstitution(String),

    /// A received value did not have the expected shape.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Expected kind of value.
        expected: &'static str,
        /// Rendered value that was found instead.
        found: String,
    },

    /// A value could not be encoded or decoded by the queue.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The run needs a tokio runtime but none was entered.
    #[error("tokio runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    /// A role task was cancelled by the runtime before it finished.
    #[error("role task cancelled: {0}")]
    Cancelled(String),
}

impl SimulationError {
    pub(crate) fn misuse(role: &RoleName, reason: impl Into<String>) -> Self {
        Self::TransportMisuse {
            role: role.clone(),
            reason: reason.into(),
        }
    }

    /// Classify the error returned by a process function.
    ///
    /// Runtime errors propagated out of a process with `?` keep their kind;
    /// anything else becomes a [`SimulationError::ProcessFailure`].
    pub(crate) fn from_process(role: &RoleName, err: anyhow::Error) -> Self {
        match err.downcast::<SimulationError>() {
            Ok(err) => err,
            Err(other) => Self::ProcessFailure {
                role: role.clone(),
                message: format!("{other:#}"),
            },
        }
    }
}

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, SimulationError>;
