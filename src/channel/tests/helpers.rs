//! Shared fixtures for the channel test suites

use crate::channel::{Channel, ChannelConfig, PartitionedChannel, PartitionedChannelConfig};
use crate::telemetry::Telemetry;
use std::future::Future;
use std::time::Duration;

/// Upper bound for anything that is expected to complete promptly
pub(super) const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// A work item routed by its `key`; `seq` is the per-key publish order
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Item {
    pub key: String,
    pub seq: u32,
}

impl Item {
    pub fn new(key: impl Into<String>, seq: u32) -> Self {
        Self {
            key: key.into(),
            seq,
        }
    }
}

pub(super) fn channel<T>(name: &str, capacity: usize) -> (Channel<T>, Telemetry) {
    let telemetry = Telemetry::new();
    let channel = Channel::new(&ChannelConfig::new(name, capacity), &telemetry)
        .expect("valid channel config");
    (channel, telemetry)
}

pub(super) fn keyed_channel(
    name: &str,
    capacity: usize,
    partitions: usize,
    telemetry: &Telemetry,
) -> PartitionedChannel<String, Item> {
    PartitionedChannel::new(
        &PartitionedChannelConfig::new(name, capacity, partitions),
        |item: &Item| item.key.clone(),
        telemetry,
    )
    .expect("valid partitioned channel config")
}

/// Find one key per partition so a test can address every partition
pub(super) fn key_per_partition(channel: &PartitionedChannel<String, Item>) -> Vec<String> {
    let mut keys: Vec<Option<String>> = vec![None; channel.partition_count()];
    let mut candidate = 0u32;
    while keys.iter().any(Option::is_none) {
        let key = format!("key-{}", candidate);
        let index = channel.partition_for_key(&key);
        if keys[index].is_none() {
            keys[index] = Some(key);
        }
        candidate += 1;
        assert!(candidate < 100_000, "could not cover every partition");
    }
    keys.into_iter().flatten().collect()
}

/// Await `future`, failing the test if it does not finish within [`TEST_TIMEOUT`]
pub(super) async fn within<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(TEST_TIMEOUT, future)
        .await
        .expect("operation timed out")
}

/// Poll `condition` until it holds, failing the test after [`TEST_TIMEOUT`]
pub(super) async fn eventually(mut condition: impl FnMut() -> bool) {
    within(async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
}
