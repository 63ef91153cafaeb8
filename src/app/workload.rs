//! Synthetic keyed workload for the `run` command
//!
//! Messages are spread round-robin over `keys` keys, each key carrying its
//! own sequence number. The handler checks that every key's sequence numbers
//! arrive strictly increasing, which is exactly the per-key ordering a
//! partitioned channel promises.

use crate::app::cli::config::WorkloadConfig;
use crate::channel::{HandlerError, MessageHandler};
use crate::core::sync::lock_or_recover;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// One unit of synthetic work
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkItem {
    /// Global publish index
    pub id: u64,
    pub key: String,
    /// Position of this item within its key
    pub seq: u64,
}

impl WorkItem {
    pub fn routing_key(&self) -> String {
        self.key.clone()
    }
}

/// Items in publish order
pub fn generate(config: &WorkloadConfig) -> impl Iterator<Item = WorkItem> {
    let keys = config.keys.max(1);
    (0..config.messages).map(move |id| WorkItem {
        id,
        key: format!("key-{}", id % keys),
        seq: id / keys,
    })
}

#[derive(Debug, thiserror::Error)]
#[error("injected failure for message {id}")]
pub struct InjectedFailure {
    pub id: u64,
}

#[derive(Debug, thiserror::Error)]
#[error("handler cancelled while processing message {id}")]
pub struct Interrupted {
    pub id: u64,
}

#[derive(Debug, Default)]
struct OrderTracker {
    last_seq: Mutex<HashMap<String, u64>>,
    violations: AtomicU64,
    observed: AtomicU64,
}

/// Message handler simulating per-message work
///
/// Clones share the same ordering tracker, so a clone kept by the caller
/// can be inspected after processing.
#[derive(Debug, Clone)]
pub struct SimulatedWorkload {
    latency: Duration,
    fail_every: u64,
    tracker: Arc<OrderTracker>,
}

impl SimulatedWorkload {
    pub fn new(config: &WorkloadConfig) -> Self {
        Self {
            latency: Duration::from_millis(config.latency_ms),
            fail_every: config.fail_every,
            tracker: Arc::default(),
        }
    }

    /// Items seen by the handler, including failed ones
    pub fn observed(&self) -> u64 {
        self.tracker.observed.load(Ordering::Acquire)
    }

    /// Items that arrived after a later item of the same key
    pub fn order_violations(&self) -> u64 {
        self.tracker.violations.load(Ordering::Acquire)
    }

    fn track(&self, item: &WorkItem) {
        self.tracker.observed.fetch_add(1, Ordering::AcqRel);
        let previous = lock_or_recover(&self.tracker.last_seq, "order tracker")
            .insert(item.key.clone(), item.seq);
        if previous.is_some_and(|seq| seq >= item.seq) {
            log::error!(
                "Out-of-order delivery for '{}': seq {} after {:?}",
                item.key,
                item.seq,
                previous
            );
            self.tracker.violations.fetch_add(1, Ordering::AcqRel);
        }
    }

    fn should_fail(&self, item: &WorkItem) -> bool {
        self.fail_every > 0 && (item.id + 1) % self.fail_every == 0
    }
}

#[async_trait]
impl MessageHandler<WorkItem> for SimulatedWorkload {
    async fn handle(&self, item: WorkItem, cancel: CancellationToken) -> Result<(), HandlerError> {
        self.track(&item);

        if !self.latency.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => return Err(Interrupted { id: item.id }.into()),
                _ = tokio::time::sleep(self.latency) => {}
            }
        }

        if self.should_fail(&item) {
            return Err(InjectedFailure { id: item.id }.into());
        }
        Ok(())
    }
}
