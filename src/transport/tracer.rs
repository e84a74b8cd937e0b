//! Tracing transport decorator
//!
//! Records every outbound send of one role into a shared event log before
//! handing it to the wrapped transport. Receives are passed through; their
//! completion shows up indirectly as a later send or a return.

use async_trait::async_trait;
use std::time::Instant;
use tracing::{debug, trace, warn};

use super::Transport;
use crate::error::Result;
use crate::trace::{Event, EventLog};
use crate::value::{RoleName, Value};

/// Transport middleware that appends a [`Event::Com`] for each send.
pub struct Tracer<T> {
    inner: T,
    role: RoleName,
    log: EventLog,
}

impl<T> Tracer<T> {
    /// Wrap `inner`, attributing its sends to `role`.
    pub fn new(inner: T, role: impl Into<RoleName>, log: EventLog) -> Self {
        Self {
            inner,
            role: role.into(),
            log,
        }
    }

    /// The role sends are attributed to.
    pub fn role(&self) -> &RoleName {
        &self.role
    }

    /// The wrapped transport.
    pub fn inner(&self) -> &T {
        &self.inner
    }
}

#[async_trait]
impl<T: Transport> Transport for Tracer<T> {
    async fn send(&self, value: Value, to: &[RoleName]) -> Result<()> {
        // Recorded before delegating so the log reflects issue order.
        self.log.push(Event::Com {
            sender: self.role.clone(),
            receivers: to.to_vec(),
            value: value.clone(),
        });
        debug!(sender = %self.role, receivers = ?to, %value, "send");
        let result = self.inner.send(value, to).await;
        if let Err(e) = &result {
            warn!(sender = %self.role, receivers = ?to, error = %e, "send: failed");
        }
        result
    }

    async fn recv(&self, from: &RoleName) -> Result<Value> {
        let start = Instant::now();
        trace!(role = %self.role, %from, "recv: start");
        let result = self.inner.recv(from).await;
        let waited = start.elapsed();
        match &result {
            Ok(value) => debug!(role = %self.role, %from, %value, ?waited, "recv: success"),
            Err(e) => warn!(role = %self.role, %from, ?waited, error = %e, "recv: failed"),
        }
        result
    }
}
