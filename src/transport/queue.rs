//! In-memory queue backing simulation runs
//!
//! One unbounded FIFO channel exists per ordered pair of participants. Values
//! travel as bincode frames so anything that crosses the queue is also
//! something a byte-oriented transport could carry.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::trace;

use super::Transport;
use crate::error::{Result, SimulationError};
use crate::value::{RoleName, Value};

/// Channel carrying frames from one role to another.
struct PairChannel {
    sender: mpsc::UnboundedSender<Vec<u8>>,
    /// Async mutex so one role may have several receives in flight.
    receiver: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
}

impl PairChannel {
    fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Mutex::new(receiver),
        }
    }
}

struct QueueInner {
    roles: BTreeSet<RoleName>,
    channels: HashMap<(RoleName, RoleName), PairChannel>,
    pending: AtomicUsize,
}

impl QueueInner {
    fn channel(&self, from: &RoleName, to: &RoleName) -> Option<&PairChannel> {
        self.channels.get(&(from.clone(), to.clone()))
    }
}

/// Shared in-memory queue for one simulation run.
///
/// Cloning yields another handle to the same queue.
#[derive(Clone)]
pub struct LocalQueue {
    inner: Arc<QueueInner>,
}

impl LocalQueue {
    /// Create a queue connecting every ordered pair of `roles`.
    pub fn new<I, R>(roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<RoleName>,
    {
        let roles: BTreeSet<RoleName> = roles.into_iter().map(Into::into).collect();
        let mut channels = HashMap::new();
        for from in &roles {
            for to in &roles {
                channels.insert((from.clone(), to.clone()), PairChannel::new());
            }
        }
        trace!(roles = roles.len(), channels = channels.len(), "LocalQueue: created");
        Self {
            inner: Arc::new(QueueInner {
                roles,
                channels,
                pending: AtomicUsize::new(0),
            }),
        }
    }

    /// Participants connected by this queue.
    pub fn roles(&self) -> impl Iterator<Item = &RoleName> {
        self.inner.roles.iter()
    }

    /// Whether `role` is connected by this queue.
    pub fn contains(&self, role: &str) -> bool {
        self.inner.roles.contains(role)
    }

    /// Transport scoped to `role`.
    pub fn role(&self, role: impl Into<RoleName>) -> Result<QueueTransport> {
        let role = role.into();
        if !self.inner.roles.contains(&role) {
            return Err(SimulationError::misuse(&role, "role is not a participant of this queue"));
        }
        Ok(self.transport(role))
    }

    /// Transport for a role the caller knows to be a participant.
    pub(crate) fn transport(&self, role: RoleName) -> QueueTransport {
        QueueTransport {
            role,
            queue: self.inner.clone(),
        }
    }

    /// Frames that were sent but not yet received.
    pub fn pending(&self) -> usize {
        self.inner.pending.load(Ordering::SeqCst)
    }
}

/// A [`LocalQueue`] as seen by a single role.
#[derive(Clone)]
pub struct QueueTransport {
    role: RoleName,
    queue: Arc<QueueInner>,
}

impl QueueTransport {
    /// The role this transport sends and receives as.
    pub fn role(&self) -> &RoleName {
        &self.role
    }

    fn unknown(&self, other: &RoleName) -> SimulationError {
        SimulationError::misuse(
            &self.role,
            format!("role {other} does not take part in this run"),
        )
    }
}

#[async_trait]
impl Transport for QueueTransport {
    async fn send(&self, value: Value, to: &[RoleName]) -> Result<()> {
        if to.is_empty() {
            return Err(SimulationError::misuse(&self.role, "send without receivers"));
        }
        // Resolve every destination before enqueueing anything so a bad
        // multicast leaves no partial delivery behind.
        let channels = to
            .iter()
            .map(|dest| {
                self.queue
                    .channel(&self.role, dest)
                    .map(|channel| (dest, channel))
                    .ok_or_else(|| self.unknown(dest))
            })
            .collect::<Result<Vec<_>>>()?;

        let frame = bincode::serialize(&value)
            .map_err(|e| SimulationError::Serialization(e.to_string()))?;

        for (dest, channel) in channels {
            channel
                .sender
                .send(frame.clone())
                .map_err(|_| {
                    SimulationError::misuse(&self.role, format!("queue to {dest} is closed"))
                })?;
            self.queue.pending.fetch_add(1, Ordering::SeqCst);
            trace!(from = %self.role, to = %dest, size = frame.len(), "LocalQueue: enqueued");
        }
        Ok(())
    }

    async fn recv(&self, from: &RoleName) -> Result<Value> {
        let channel = self
            .queue
            .channel(from, &self.role)
            .ok_or_else(|| self.unknown(from))?;

        trace!(%from, to = %self.role, "LocalQueue: waiting");
        let frame = channel
            .receiver
            .lock()
            .await
            .recv()
            .await
            .ok_or_else(|| {
                SimulationError::misuse(&self.role, format!("queue from {from} is closed"))
            })?;
        self.queue.pending.fetch_sub(1, Ordering::SeqCst);

        bincode::deserialize(&frame).map_err(|e| SimulationError::Serialization(e.to_string()))
    }
}
