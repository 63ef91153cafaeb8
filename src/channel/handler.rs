//! Message handler abstraction

use crate::channel::error::HandlerError;
use async_trait::async_trait;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Processes one message taken from a partition
///
/// Implemented for any `Fn(T, CancellationToken) -> impl Future` closure, so
/// most callers pass an async closure. Implement the trait directly when the
/// handler carries state.
///
/// A handler should observe `cancel` for any long-running work. Returning an
/// error (or panicking) marks the message as failed; the partition keeps
/// processing subsequent messages either way.
#[async_trait]
pub trait MessageHandler<T>: Send + Sync + 'static {
    async fn handle(&self, message: T, cancel: CancellationToken) -> Result<(), HandlerError>;
}

#[async_trait]
impl<T, F, Fut> MessageHandler<T> for F
where
    T: Send + 'static,
    F: Fn(T, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    async fn handle(&self, message: T, cancel: CancellationToken) -> Result<(), HandlerError> {
        (self)(message, cancel).await
    }
}
