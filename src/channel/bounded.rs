//! Bounded, instrumented FIFO channel
//!
//! The channel keeps its queue behind a `std::sync::Mutex` that is only held
//! for push/pop, never across an `.await`. Free capacity is modelled as a
//! fair `tokio::sync::Semaphore`: a publisher acquires one permit per
//! message and a reader returns it when it takes the message out, so every
//! read wakes at most one waiting publisher, in arrival order. Readers park
//! on a `Notify` that is signalled once per published message and for all
//! waiters when the channel completes.

use crate::channel::config::ChannelConfig;
use crate::channel::envelope::Envelope;
use crate::channel::error::{ChannelError, ChannelResult, HandlerError};
use crate::channel::reader::ChannelReader;
use crate::channel::stats::ChannelStats;
use crate::core::sync::lock_or_recover;
use crate::telemetry::{spans, ChannelMetrics, Telemetry};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};
use tokio_util::sync::CancellationToken;

pub(crate) struct ChannelState<T> {
    pub(crate) queue: VecDeque<Envelope<T>>,
    pub(crate) completed: bool,
}

pub(crate) struct ChannelInner<T> {
    pub(crate) name: String,
    pub(crate) partition: Option<usize>,
    pub(crate) capacity: usize,
    pub(crate) state: Mutex<ChannelState<T>>,
    /// One permit per free slot
    pub(crate) slots: Semaphore,
    /// Signalled per published message and on completion
    pub(crate) items: Notify,
    pub(crate) metrics: ChannelMetrics,
    pub(crate) telemetry: Telemetry,
}

impl<T> ChannelInner<T> {
    pub(crate) fn lock_state(&self) -> MutexGuard<'_, ChannelState<T>> {
        lock_or_recover(&self.state, &self.name)
    }
}

/// A bounded multi-producer channel with a single logical consumer group
///
/// Publishing into a full channel waits until a reader frees a slot, so a
/// slow consumer pushes back on its producers instead of growing memory or
/// dropping messages. Messages are delivered in exactly the order they were
/// admitted.
///
/// Cloning a `Channel` yields another handle to the same queue.
///
/// # Example
///
/// ```rust,no_run
/// use partichan::channel::{Channel, ChannelConfig};
/// use partichan::telemetry::Telemetry;
/// use tokio_util::sync::CancellationToken;
/// use std::time::Instant;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let telemetry = Telemetry::new();
/// let channel = Channel::new(&ChannelConfig::new("audit", 2), &telemetry)?;
/// let cancel = CancellationToken::new();
///
/// channel.publish("a".to_string(), &cancel).await?;
///
/// let reader = channel.reader();
/// if let Some(envelope) = reader.read(&cancel).await? {
///     let started = Instant::now();
///     println!("got {}", envelope.message());
///     channel.record_processed(&envelope, started.elapsed());
/// }
/// # Ok(())
/// # }
/// ```
pub struct Channel<T> {
    inner: Arc<ChannelInner<T>>,
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.inner.name)
            .field("partition", &self.inner.partition)
            .field("capacity", &self.inner.capacity)
            .field("queue_depth", &self.inner.metrics.queue_depth())
            .finish()
    }
}

impl<T> Channel<T> {
    /// Create a standalone channel, registering its instruments with `telemetry`
    pub fn new(config: &ChannelConfig, telemetry: &Telemetry) -> ChannelResult<Self> {
        config.validate()?;
        Self::build(config.name.clone(), None, config.capacity, telemetry)
    }

    /// Create one partition of a partitioned channel
    pub(crate) fn partition(
        name: &str,
        partition: usize,
        capacity: usize,
        telemetry: &Telemetry,
    ) -> ChannelResult<Self> {
        Self::build(name.to_string(), Some(partition), capacity, telemetry)
    }

    fn build(
        name: String,
        partition: Option<usize>,
        capacity: usize,
        telemetry: &Telemetry,
    ) -> ChannelResult<Self> {
        let metrics = ChannelMetrics::register(telemetry.registry(), &name, partition)?;
        log::debug!(
            "Created channel '{}' (partition: {:?}, capacity: {})",
            name,
            partition,
            capacity
        );
        Ok(Self {
            inner: Arc::new(ChannelInner {
                name,
                partition,
                capacity,
                state: Mutex::new(ChannelState {
                    queue: VecDeque::with_capacity(capacity.min(1024)),
                    completed: false,
                }),
                slots: Semaphore::new(capacity),
                items: Notify::new(),
                metrics,
                telemetry: telemetry.clone(),
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Partition index when owned by a partitioned channel
    pub fn partition_index(&self) -> Option<usize> {
        self.inner.partition
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Messages published but not yet recorded as processed or failed
    pub fn queue_depth(&self) -> usize {
        self.inner.metrics.queue_depth()
    }

    /// Messages currently sitting in the queue, waiting for a reader
    pub fn buffered(&self) -> usize {
        self.inner.lock_state().queue.len()
    }

    pub fn is_completed(&self) -> bool {
        self.inner.lock_state().completed
    }

    pub fn metrics(&self) -> &ChannelMetrics {
        &self.inner.metrics
    }

    pub(crate) fn telemetry(&self) -> &Telemetry {
        &self.inner.telemetry
    }

    /// Consumer-side handle for taking messages out of this channel
    pub fn reader(&self) -> ChannelReader<T> {
        ChannelReader::new(Arc::clone(&self.inner))
    }

    /// Publish a message, waiting for capacity if the channel is full
    ///
    /// # Errors
    /// - [`ChannelError::Closed`] if the channel has been completed, including
    ///   while this call was waiting for capacity
    /// - [`ChannelError::Cancelled`] if `cancel` fires before the message is
    ///   admitted; the message is dropped
    pub async fn publish(&self, message: T, cancel: &CancellationToken) -> ChannelResult<()> {
        let span = spans::publish_span(
            self.inner.telemetry.tracer(),
            &self.inner.name,
            self.inner.partition,
        );
        match self.admit(message, cancel).await {
            Ok(()) => {
                spans::end_ok(&span);
                Ok(())
            }
            Err(e) => {
                spans::end_with_error(&span, e.to_string());
                Err(e)
            }
        }
    }

    async fn admit(&self, message: T, cancel: &CancellationToken) -> ChannelResult<()> {
        if self.is_completed() {
            return Err(ChannelError::closed(&self.inner.name));
        }

        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log::debug!("Publish to '{}' cancelled while waiting for capacity", self.inner.name);
                return Err(ChannelError::cancelled(&self.inner.name));
            }
            permit = self.inner.slots.acquire() => {
                permit.map_err(|_| ChannelError::closed(&self.inner.name))?
            }
        };

        {
            let mut state = self.inner.lock_state();
            if state.completed {
                // Dropping the permit hands the slot back
                return Err(ChannelError::closed(&self.inner.name));
            }
            // The slot is returned by the reader that takes this message out
            permit.forget();
            state.queue.push_back(Envelope::new(message));
            self.inner.metrics.record_published();
        }
        self.inner.items.notify_one();
        Ok(())
    }

    /// Record a successfully handled message
    ///
    /// `duration` is the handler's execution time; queue wait is measured
    /// from the envelope's enqueue timestamp to now.
    pub fn record_processed<M>(&self, envelope: &Envelope<M>, duration: Duration) {
        let queue_wait = envelope.queue_wait();
        self.inner.metrics.record_processed(duration, queue_wait);
        log::trace!(
            "'{}' processed message in {:?} (queue wait {:?})",
            self.inner.name,
            duration,
            queue_wait
        );
    }

    /// Record a message whose handler failed; the message is not retried
    ///
    /// Only the failed counter and the queue depth move. The envelope's queue
    /// wait is logged but kept out of the queue-wait histogram, which covers
    /// processed messages only.
    pub fn record_failed<M>(&self, envelope: &Envelope<M>, error: &HandlerError) {
        self.inner.metrics.record_failed(error.category());
        log::warn!(
            "'{}' (partition {:?}) failed to process message after {:?} queued: {}",
            self.inner.name,
            self.inner.partition,
            envelope.queue_wait(),
            error
        );
    }

    /// Close the channel for publishing
    ///
    /// Idempotent. Already queued messages remain readable; publishers still
    /// waiting for capacity fail with [`ChannelError::Closed`].
    pub fn complete(&self) {
        {
            let mut state = self.inner.lock_state();
            if state.completed {
                return;
            }
            state.completed = true;
        }
        self.inner.slots.close();
        self.inner.items.notify_waiters();
        log::debug!("Channel '{}' completed", self.inner.name);
    }

    /// Point-in-time snapshot of this channel's counters
    pub fn stats(&self) -> ChannelStats {
        let (buffered, completed) = {
            let state = self.inner.lock_state();
            (state.queue.len(), state.completed)
        };
        let metrics = &self.inner.metrics;
        ChannelStats {
            name: self.inner.name.clone(),
            partition: self.inner.partition,
            capacity: self.inner.capacity,
            buffered,
            queue_depth: metrics.queue_depth(),
            published: metrics.published(),
            processed: metrics.processed(),
            failed: metrics.failed(),
            completed,
        }
    }
}
