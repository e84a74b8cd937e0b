//! Transport capability used by role environments
//!
//! A transport moves values between roles addressed by name. The runtime only
//! relies on two properties: `send` never waits for the receiver, and values
//! sent from one role to another are received in the order they were sent.
//! Nothing is guaranteed across different sender/receiver pairs.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::value::{RoleName, Value};

pub mod queue;
pub mod tracer;

pub use queue::{LocalQueue, QueueTransport};
pub use tracer::Tracer;

/// Point-to-point message exchange keyed by role name.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Enqueue `value` for every role in `to`.
    ///
    /// Completes as soon as the value has been handed to the underlying
    /// queue; it never waits for a matching receive.
    async fn send(&self, value: Value, to: &[RoleName]) -> Result<()>;

    /// Wait for the next value sent to this role by `from`.
    async fn recv(&self, from: &RoleName) -> Result<Value>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, value: Value, to: &[RoleName]) -> Result<()> {
        (**self).send(value, to).await
    }

    async fn recv(&self, from: &RoleName) -> Result<Value> {
        (**self).recv(from).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn send(&self, value: Value, to: &[RoleName]) -> Result<()> {
        (**self).send(value, to).await
    }

    async fn recv(&self, from: &RoleName) -> Result<Value> {
        (**self).recv(from).await
    }
}
