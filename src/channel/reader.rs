//! Consumer-side access to a channel
//!
//! A [`ChannelReader`] offers three ways of taking messages out of a channel:
//! a non-blocking [`try_read`](ChannelReader::try_read), a
//! [`wait_to_read`](ChannelReader::wait_to_read) that parks until something
//! is available, and [`stream`](ChannelReader::stream) which turns the
//! channel into a lazy `futures::Stream` that ends once the channel is
//! completed and drained.
//!
//! Every message taken out returns one capacity slot to the channel, waking
//! at most one waiting publisher.

use crate::channel::bounded::ChannelInner;
use crate::channel::envelope::Envelope;
use crate::channel::error::{ChannelError, ChannelResult};
use futures::stream::{self, Stream};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Reader handle; clones share the same underlying queue
pub struct ChannelReader<T> {
    inner: Arc<ChannelInner<T>>,
}

impl<T> Clone for ChannelReader<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for ChannelReader<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelReader")
            .field("channel", &self.inner.name)
            .field("partition", &self.inner.partition)
            .finish()
    }
}

impl<T> ChannelReader<T> {
    pub(crate) fn new(inner: Arc<ChannelInner<T>>) -> Self {
        Self { inner }
    }

    pub fn channel_name(&self) -> &str {
        &self.inner.name
    }

    /// Take the next message if one is queued, without waiting
    pub fn try_read(&self) -> Option<Envelope<T>> {
        let envelope = self.inner.lock_state().queue.pop_front();
        if envelope.is_some() {
            self.inner.slots.add_permits(1);
        }
        envelope
    }

    /// Wait until a message is available
    ///
    /// Returns `Ok(true)` when at least one message is queued and `Ok(false)`
    /// once the channel is completed and empty. A `true` result is a hint:
    /// another reader of the same channel may take the message first.
    ///
    /// # Errors
    /// [`ChannelError::Cancelled`] if `cancel` fires while waiting.
    pub async fn wait_to_read(&self, cancel: &CancellationToken) -> ChannelResult<bool> {
        loop {
            // Register interest before inspecting the queue so a publish
            // landing in between still wakes us
            let notified = self.inner.items.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let state = self.inner.lock_state();
                if !state.queue.is_empty() {
                    return Ok(true);
                }
                if state.completed {
                    return Ok(false);
                }
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(ChannelError::cancelled(&self.inner.name));
                }
                _ = &mut notified => {}
            }
        }
    }

    /// Wait for and take the next message
    ///
    /// Returns `Ok(None)` once the channel is completed and drained.
    pub async fn read(&self, cancel: &CancellationToken) -> ChannelResult<Option<Envelope<T>>> {
        loop {
            if let Some(envelope) = self.try_read() {
                return Ok(Some(envelope));
            }
            if !self.wait_to_read(cancel).await? {
                return Ok(None);
            }
        }
    }

    /// Lazy stream of envelopes
    ///
    /// Each call builds a fresh stream starting at the current head of the
    /// queue. The stream waits between items and ends when the channel is
    /// completed and drained, or when `cancel` fires.
    pub fn stream(&self, cancel: CancellationToken) -> impl Stream<Item = Envelope<T>> + Send
    where
        T: Send + 'static,
    {
        stream::unfold((self.clone(), cancel), |(reader, cancel)| async move {
            match reader.read(&cancel).await {
                Ok(Some(envelope)) => Some((envelope, (reader, cancel))),
                Ok(None) => None,
                Err(e) => {
                    log::debug!("Stream over '{}' ended: {}", reader.inner.name, e);
                    None
                }
            }
        })
    }
}
