//! Protocol client seam.
//!
//! A [`Runner`] wraps one connection to a language runner process. The
//! executor sends one message at a time and waits for its status; transport,
//! serialization and connection management belong to the implementation.

use async_trait::async_trait;
use std::sync::Arc;
use step_core::{ExecutionStatus, Message};

#[async_trait]
pub trait Runner: Send + Sync {
    /// Send `message` and wait for the runner's verdict.
    ///
    /// Implementations must not surface transport errors separately: a lost
    /// connection is reported as a failed status carrying the error text.
    async fn execute_and_get_status(&self, message: Message) -> ExecutionStatus;
}

#[async_trait]
impl<R: Runner + ?Sized> Runner for Arc<R> {
    async fn execute_and_get_status(&self, message: Message) -> ExecutionStatus {
        (**self).execute_and_get_status(message).await
    }
}
