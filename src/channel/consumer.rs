//! Per-partition consumption loops
//!
//! Each partition of a [`PartitionedChannel`](crate::channel::PartitionedChannel)
//! is drained by its own tokio task. A loop handles exactly one message at a
//! time, so ordering within a partition is preserved, while loops on
//! different partitions run independently of each other.
//!
//! ```text
//!        ┌──────────── cancelled / completed and drained ───────────┐
//!        │                                                          ▼
//!   ┌────┴───┐  envelope read   ┌────────────┐                ┌─────────┐
//!   │  Idle  │ ───────────────► │ Processing │                │ Stopped │
//!   └────────┘ ◄─────────────── └────────────┘                └─────────┘
//!                recorded ok/failed
//! ```

use crate::channel::bounded::Channel;
use crate::channel::error::{ChannelError, ChannelResult, HandlerError};
use crate::channel::handler::MessageHandler;
use crate::telemetry::spans;
use futures::FutureExt as _;
use opentelemetry::trace::FutureExt as _;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Observable state of one partition loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
pub enum LoopState {
    /// Waiting for the next message
    Idle = 0,
    /// A handler invocation is in flight
    Processing = 1,
    /// The loop has exited
    Stopped = 2,
}

impl LoopState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => LoopState::Idle,
            1 => LoopState::Processing,
            _ => LoopState::Stopped,
        }
    }
}

#[derive(Debug)]
pub(crate) struct LoopStateCell(AtomicU8);

impl LoopStateCell {
    fn new() -> Self {
        Self(AtomicU8::new(LoopState::Idle as u8))
    }

    fn set(&self, state: LoopState) {
        self.0.store(state as u8, Ordering::Release);
    }

    fn get(&self) -> LoopState {
        LoopState::from_u8(self.0.load(Ordering::Acquire))
    }
}

/// What one partition loop did before it stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PartitionReport {
    pub partition: usize,
    pub processed: u64,
    pub failed: u64,
}

/// Handle over the consumption loops started by `start_processing`
///
/// Dropping the handle does not stop the loops; call [`stop`](Self::stop)
/// or cancel the token passed to `start_processing`.
#[derive(Debug)]
pub struct ProcessingHandle {
    tasks: Vec<JoinHandle<PartitionReport>>,
    states: Vec<Arc<LoopStateCell>>,
    cancel: CancellationToken,
}

impl ProcessingHandle {
    pub fn partition_count(&self) -> usize {
        self.tasks.len()
    }

    /// Current state of every loop, indexed by partition
    pub fn states(&self) -> Vec<LoopState> {
        self.states.iter().map(|s| s.get()).collect()
    }

    pub fn is_finished(&self) -> bool {
        self.tasks.iter().all(|t| t.is_finished())
    }

    /// Request every loop to stop after its current message
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Wait for every loop to exit
    ///
    /// Loops exit when cancelled or once their partition is completed and
    /// drained.
    ///
    /// # Errors
    /// [`ChannelError::TaskFailed`] if a loop task could not be joined.
    pub async fn join(self) -> ChannelResult<Vec<PartitionReport>> {
        let mut reports = Vec::with_capacity(self.tasks.len());
        for (partition, task) in self.tasks.into_iter().enumerate() {
            let report = task.await.map_err(|e| ChannelError::TaskFailed {
                partition,
                message: e.to_string(),
            })?;
            reports.push(report);
        }
        Ok(reports)
    }
}

/// Spawn one loop per partition
pub(crate) fn spawn_loops<T, H>(
    partitions: &[Channel<T>],
    handler: H,
    cancel: &CancellationToken,
) -> ProcessingHandle
where
    T: Send + 'static,
    H: MessageHandler<T>,
{
    let handler = Arc::new(handler);
    let cancel = cancel.child_token();
    let mut tasks = Vec::with_capacity(partitions.len());
    let mut states = Vec::with_capacity(partitions.len());

    for (partition, channel) in partitions.iter().enumerate() {
        let state = Arc::new(LoopStateCell::new());
        states.push(Arc::clone(&state));
        tasks.push(tokio::spawn(run_partition(
            partition,
            channel.clone(),
            Arc::clone(&handler),
            cancel.clone(),
            state,
        )));
    }

    ProcessingHandle {
        tasks,
        states,
        cancel,
    }
}

async fn run_partition<T, H>(
    partition: usize,
    channel: Channel<T>,
    handler: Arc<H>,
    cancel: CancellationToken,
    state: Arc<LoopStateCell>,
) -> PartitionReport
where
    T: Send + 'static,
    H: MessageHandler<T>,
{
    let reader = channel.reader();
    let mut report = PartitionReport {
        partition,
        processed: 0,
        failed: 0,
    };
    log::info!(
        "Starting consumer loop for '{}' partition {}",
        channel.name(),
        partition
    );

    while !cancel.is_cancelled() {
        state.set(LoopState::Idle);
        let envelope = match reader.read(&cancel).await {
            Ok(Some(envelope)) => envelope,
            Ok(None) => break,
            Err(e) => {
                log::debug!("Consumer loop for partition {} interrupted: {}", partition, e);
                break;
            }
        };

        state.set(LoopState::Processing);
        let (message, receipt) = envelope.split();
        let cx = spans::process_span(channel.telemetry().tracer(), channel.name(), Some(partition));

        let started = Instant::now();
        let outcome = AssertUnwindSafe(
            handler
                .handle(message, cancel.clone())
                .with_context(cx.clone()),
        )
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| Err(HandlerError::from_panic(payload)));
        let elapsed = started.elapsed();

        match outcome {
            Ok(()) => {
                spans::end_ok(&cx);
                channel.record_processed(&receipt, elapsed);
                report.processed += 1;
            }
            Err(error) => {
                spans::end_failed(&cx, &error);
                channel.record_failed(&receipt, &error);
                report.failed += 1;
            }
        }
    }

    state.set(LoopState::Stopped);
    log::debug!(
        "Consumer loop for '{}' partition {} stopped (processed: {}, failed: {})",
        channel.name(),
        partition,
        report.processed,
        report.failed
    );
    report
}
