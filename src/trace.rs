//! Execution traces of simulation runs.
//!
//! A trace is the ordered sequence of communications and completions
//! observed while the role processes of one run were executing. Events are
//! appended by concurrently running roles, so their order reflects the real
//! interleaving of the run and not any sort by role or time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::value::{RoleName, Value};

/// A single observable step of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// A value was sent. Recorded when the send is issued, not when it is
    /// delivered.
    Com {
        /// Role that issued the send.
        sender: RoleName,
        /// Destination roles, in the order they were named.
        receivers: Vec<RoleName>,
        /// The value sent.
        value: Value,
    },
    /// A role's process function completed.
    Return {
        /// The completed role.
        role: RoleName,
        /// The process result, if it produced one.
        value: Option<Value>,
    },
}

impl Event {
    /// The role that produced this event.
    pub fn role(&self) -> &RoleName {
        match self {
            Event::Com { sender, .. } => sender,
            Event::Return { role, .. } => role,
        }
    }

    /// Whether this is a [`Event::Com`].
    pub fn is_com(&self) -> bool {
        matches!(self, Event::Com { .. })
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Com {
                sender,
                receivers,
                value,
            } => {
                write!(f, "{sender} -> [")?;
                for (i, receiver) in receivers.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{receiver}")?;
                }
                write!(f, "]: {value}")
            }
            Event::Return { role, value: None } => write!(f, "Return {role}"),
            Event::Return {
                role,
                value: Some(value),
            } => write!(f, "Return {role}: {value}"),
        }
    }
}

/// Ordered events of one complete run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    events: Vec<Event>,
}

impl Trace {
    /// Create a trace from recorded events.
    #[must_use]
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }

    /// All events in append order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Communication events in append order.
    pub fn coms(&self) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(|e| e.is_com())
    }

    /// Completion events in append order.
    pub fn returns(&self) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(|e| !e.is_com())
    }

    /// Communication events issued by `role`.
    pub fn sends_from<'a>(&'a self, role: &'a str) -> impl Iterator<Item = &'a Event> + 'a {
        self.coms().filter(move |e| e.role() == role)
    }

    /// Result recorded for `role`.
    ///
    /// Returns `None` when the role has not completed, `Some(None)` when it
    /// completed without a value.
    pub fn return_value(&self, role: &str) -> Option<Option<&Value>> {
        self.events.iter().find_map(|event| match event {
            Event::Return { role: r, value } if r == role => Some(value.as_ref()),
            _ => None,
        })
    }

    /// Consume the trace, yielding its events.
    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for event in &self.events {
            writeln!(f, "{event}")?;
        }
        Ok(())
    }
}

impl IntoIterator for Trace {
    type Item = Event;
    type IntoIter = std::vec::IntoIter<Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl<'a> IntoIterator for &'a Trace {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

/// Shared append-only event sequence.
///
/// Cloning yields another handle to the same sequence. Appends from
/// concurrently running roles are serialized by an internal mutex.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<Event>>>,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Event>> {
        // A panicking appender cannot leave a half-written Vec behind.
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an event.
    pub fn push(&self, event: Event) {
        self.lock().push(event);
    }

    /// Number of events recorded so far.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of the events recorded so far.
    pub fn snapshot(&self) -> Trace {
        Trace::new(self.lock().clone())
    }

    /// Take the recorded events, leaving the log empty.
    pub fn take(&self) -> Trace {
        Trace::new(std::mem::take(&mut *self.lock()))
    }
}
