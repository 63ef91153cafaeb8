//! Key-partitioned channel
//!
//! A [`PartitionedChannel`] owns a fixed set of bounded [`Channel`]s and
//! routes every message to exactly one of them by hashing a key extracted
//! from the message. Messages sharing a key always land on the same
//! partition, and each partition is consumed by a single loop, so per-key
//! publish order is preserved while different keys are processed in
//! parallel.

use crate::channel::bounded::Channel;
use crate::channel::config::PartitionedChannelConfig;
use crate::channel::consumer::{self, ProcessingHandle};
use crate::channel::error::{ChannelError, ChannelResult};
use crate::channel::handler::MessageHandler;
use crate::channel::stats::ChannelStats;
use crate::core::hashing::{partition_index, StableBuildHasher};
use crate::telemetry::Telemetry;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;

type KeySelector<T, K> = Box<dyn Fn(&T) -> K + Send + Sync>;

/// A set of bounded channels addressed by message key
///
/// Routing is `hash(key) % partition_count`. The default hasher is the
/// 64-bit FNV-1a [`StableBuildHasher`], so a given key maps to the same
/// partition across processes and Rust releases; use
/// [`with_hasher`](Self::with_hasher) to supply a different one. The exact
/// spread of keys over partitions is not part of the contract.
///
/// # Example
///
/// ```rust,no_run
/// use partichan::channel::{HandlerError, PartitionedChannel, PartitionedChannelConfig};
/// use partichan::telemetry::Telemetry;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let telemetry = Telemetry::new();
/// let config = PartitionedChannelConfig::new("orders", 64, 4);
/// let channel = PartitionedChannel::new(&config, |order: &(String, u32)| order.0.clone(), &telemetry)?;
/// let cancel = CancellationToken::new();
///
/// let handle = channel.start_processing(
///     |order: (String, u32), _cancel: CancellationToken| async move {
///         println!("{} #{}", order.0, order.1);
///         Ok::<(), HandlerError>(())
///     },
///     &cancel,
/// )?;
///
/// channel.publish(("alice".to_string(), 1), &cancel).await?;
/// channel.complete();
/// handle.join().await?;
/// # Ok(())
/// # }
/// ```
pub struct PartitionedChannel<K, T, S = StableBuildHasher> {
    name: String,
    partitions: Vec<Channel<T>>,
    key_selector: KeySelector<T, K>,
    hash_builder: S,
    /// Set once consumer loops have been spawned
    processing_started: AtomicBool,
}

impl<K, T, S> fmt::Debug for PartitionedChannel<K, T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartitionedChannel")
            .field("name", &self.name)
            .field("partitions", &self.partitions.len())
            .finish_non_exhaustive()
    }
}

impl<K, T> PartitionedChannel<K, T, StableBuildHasher>
where
    K: Hash,
{
    /// Create a partitioned channel routed by the stable FNV-1a hasher
    ///
    /// `key_selector` must be deterministic: the same message must always
    /// yield the same key.
    pub fn new<F>(
        config: &PartitionedChannelConfig,
        key_selector: F,
        telemetry: &Telemetry,
    ) -> ChannelResult<Self>
    where
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Self::with_hasher(config, key_selector, StableBuildHasher, telemetry)
    }
}

impl<K, T, S> PartitionedChannel<K, T, S>
where
    K: Hash,
    S: BuildHasher,
{
    /// Create a partitioned channel routed by a caller-supplied hasher
    pub fn with_hasher<F>(
        config: &PartitionedChannelConfig,
        key_selector: F,
        hash_builder: S,
        telemetry: &Telemetry,
    ) -> ChannelResult<Self>
    where
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        config.validate()?;
        let partitions = (0..config.partitions)
            .map(|index| Channel::partition(&config.name, index, config.capacity, telemetry))
            .collect::<ChannelResult<Vec<_>>>()?;

        log::debug!(
            "Created partitioned channel '{}' with {} partitions of capacity {}",
            config.name,
            config.partitions,
            config.capacity
        );

        Ok(Self {
            name: config.name.clone(),
            partitions,
            key_selector: Box::new(key_selector),
            hash_builder,
            processing_started: AtomicBool::new(false),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Capacity of each individual partition
    pub fn capacity(&self) -> usize {
        self.partitions.first().map_or(0, Channel::capacity)
    }

    /// Partition a key routes to
    pub fn partition_for_key(&self, key: &K) -> usize {
        partition_index(key, self.partitions.len(), &self.hash_builder)
    }

    /// Partition a message routes to
    pub fn partition_for(&self, message: &T) -> usize {
        self.partition_for_key(&(self.key_selector)(message))
    }

    /// Route a message to its partition and publish it there
    ///
    /// Waits while that partition is full. Returns the partition index the
    /// message was admitted to.
    ///
    /// # Errors
    /// Same as [`Channel::publish`]: `Closed` after [`complete`](Self::complete),
    /// `Cancelled` if `cancel` fires while waiting for capacity.
    pub async fn publish(&self, message: T, cancel: &CancellationToken) -> ChannelResult<usize> {
        let index = self.partition_for(&message);
        self.partitions[index].publish(message, cancel).await?;
        Ok(index)
    }

    /// Start one consumption loop per partition
    ///
    /// Every loop receives a child of `cancel`, and the same child token is
    /// handed to each handler invocation. Handler errors and panics are
    /// recorded against the partition and do not stop the loop.
    ///
    /// Processing can be started only once per channel, so each partition
    /// has at most one handler invocation in flight.
    ///
    /// # Errors
    /// `AlreadyProcessing` if loops were already started for this channel.
    pub fn start_processing<H>(
        &self,
        handler: H,
        cancel: &CancellationToken,
    ) -> ChannelResult<ProcessingHandle>
    where
        T: Send + 'static,
        H: MessageHandler<T>,
    {
        if self.processing_started.swap(true, Ordering::AcqRel) {
            log::warn!("Consumer loops for '{}' are already running", self.name);
            return Err(ChannelError::AlreadyProcessing {
                channel: self.name.clone(),
            });
        }
        log::info!(
            "Starting {} consumer loops for '{}'",
            self.partitions.len(),
            self.name
        );
        Ok(consumer::spawn_loops(&self.partitions, handler, cancel))
    }

    /// Whether [`start_processing`](Self::start_processing) has been called
    pub fn is_processing_started(&self) -> bool {
        self.processing_started.load(Ordering::Acquire)
    }

    /// Close every partition for publishing; queued messages stay drainable
    pub fn complete(&self) {
        for partition in &self.partitions {
            partition.complete();
        }
    }

    pub fn is_completed(&self) -> bool {
        self.partitions.iter().all(Channel::is_completed)
    }

    /// Published but not yet recorded messages across all partitions
    pub fn queue_depth(&self) -> usize {
        self.partitions.iter().map(Channel::queue_depth).sum()
    }

    /// Per-partition snapshots, indexed by partition
    pub fn stats(&self) -> Vec<ChannelStats> {
        self.partitions.iter().map(Channel::stats).collect()
    }
}
