//! Role environments handed to compiled process functions.
//!
//! A process function is compiled once for a static role pattern such as
//! `(A, B)` but invoked with whatever concrete roles the call site supplies.
//! [`Env`] resolves the static names through a substitution table before
//! every communication, so the transport only ever sees concrete roles.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Result, SimulationError};
use crate::transport::Transport;
use crate::value::{RoleName, Value};

/// Per-role handle combining a transport with a role substitution.
///
/// Environments are immutable: [`Env::subst`] returns a new environment that
/// shares the transport, leaving the original untouched.
#[derive(Clone)]
pub struct Env {
    transport: Arc<dyn Transport>,
    subst: Arc<HashMap<RoleName, RoleName>>,
}

impl Env {
    /// Root environment with an empty substitution.
    pub fn new<T: Transport + 'static>(transport: T) -> Self {
        Self::from_shared(Arc::new(transport))
    }

    /// Root environment around an already shared transport.
    pub fn from_shared(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            subst: Arc::default(),
        }
    }

    /// Map a static role name to the role substituted at the current call.
    ///
    /// Names without a substitution resolve to themselves.
    pub fn role(&self, name: &str) -> RoleName {
        self.subst
            .get(name)
            .cloned()
            .unwrap_or_else(|| RoleName::from(name))
    }

    /// Send `value` to every role in `roles` after resolving them.
    pub async fn send(&self, value: impl Into<Value>, roles: &[&str]) -> Result<()> {
        let value = value.into();
        let resolved: Vec<RoleName> = roles.iter().map(|r| self.role(r)).collect();
        self.transport.send(value, &resolved).await
    }

    /// Receive the next value sent by the role `from` resolves to.
    pub async fn recv(&self, from: &str) -> Result<Value> {
        let from = self.role(from);
        self.transport.recv(&from).await
    }

    /// Receive and convert to a concrete Rust type.
    pub async fn recv_as<T>(&self, from: &str) -> Result<T>
    where
        T: TryFrom<Value, Error = SimulationError>,
    {
        T::try_from(self.recv(from).await?)
    }

    /// Environment for invoking a function with renamed roles.
    ///
    /// Each `(old, new)` pair binds the callee's static role `new` to
    /// whatever `old` resolves to here. Resolution goes through this
    /// environment's own table, which is what makes nested and
    /// higher-order calls land on the original concrete roles.
    pub fn subst(&self, pairs: &[(&str, &str)]) -> Env {
        let table = pairs
            .iter()
            .map(|(old, new)| (RoleName::from(*new), self.role(old)))
            .collect();
        Env {
            transport: self.transport.clone(),
            subst: Arc::new(table),
        }
    }

    /// [`Env::subst`] taking the flat `old, new, old, new, ...` form emitted
    /// by the compiler.
    pub fn subst_flat(&self, roles: &[&str]) -> Result<Env> {
        if roles.len() % 2 != 0 {
            return Err(SimulationError::InvalidSubstitution(format!(
                "expected old/new pairs, got {} names",
                roles.len()
            )));
        }
        let pairs: Vec<(&str, &str)> = roles.chunks_exact(2).map(|p| (p[0], p[1])).collect();
        Ok(self.subst(&pairs))
    }

    /// Current substitution entries.
    pub fn substitutions(&self) -> impl Iterator<Item = (&RoleName, &RoleName)> {
        self.subst.iter()
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Env").field("subst", &self.subst).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{Event, EventLog};
    use crate::transport::{LocalQueue, Tracer};

    fn env_for(queue: &LocalQueue, role: &str, log: &EventLog) -> Env {
        Env::new(Tracer::new(queue.role(role).unwrap(), role, log.clone()))
    }

    #[test]
    fn unsubstituted_names_resolve_to_themselves() {
        let env = Env::new(LocalQueue::new(["A"]).role("A").unwrap());
        assert_eq!(env.role("A"), "A");
        assert_eq!(env.role("Other"), "Other");
    }

    #[test]
    fn subst_swaps_roles() {
        let env = Env::new(LocalQueue::new(["A", "B"]).role("A").unwrap());
        let swapped = env.subst(&[("B", "A"), ("A", "B")]);
        assert_eq!(swapped.role("A"), "B");
        assert_eq!(swapped.role("B"), "A");
        // The receiver is unchanged.
        assert_eq!(env.role("A"), "A");
        assert_eq!(env.substitutions().count(), 0);
    }

    #[test]
    fn subst_composes_through_existing_table() {
        let env = Env::new(LocalQueue::new(["A"]).role("A").unwrap());
        let first = env.subst(&[("A", "X")]);
        let second = first.subst(&[("X", "Y")]);
        assert_eq!(second.role("Y"), "A");
        // Entries not re-bound by the new call are dropped.
        assert_eq!(second.role("X"), "X");
    }

    #[test]
    fn subst_flat_requires_pairs() {
        let env = Env::new(LocalQueue::new(["A"]).role("A").unwrap());
        let sub = env.subst_flat(&["A", "X", "B", "Y"]).unwrap();
        assert_eq!(sub.role("X"), "A");
        assert_eq!(sub.role("Y"), "B");
        assert!(matches!(
            env.subst_flat(&["A", "X", "B"]),
            Err(SimulationError::InvalidSubstitution(_))
        ));
    }

    #[tokio::test]
    async fn send_and_recv_use_resolved_names() {
        let queue = LocalQueue::new(["A", "B"]);
        let log = EventLog::new();
        let a = env_for(&queue, "A", &log).subst(&[("A", "Me"), ("B", "Peer")]);
        let b = env_for(&queue, "B", &log).subst(&[("A", "Peer")]);

        a.send(5, &["Peer"]).await.unwrap();
        assert_eq!(b.recv_as::<i64>("Peer").await.unwrap(), 5);

        assert_eq!(
            log.snapshot().events()[0],
            Event::Com {
                sender: "A".into(),
                receivers: vec!["B".into()],
                value: Value::Int(5),
            }
        );
    }
}
