//! Common test utilities and helpers

#![allow(dead_code)]

use partichan::channel::{PartitionedChannel, PartitionedChannelConfig};
use partichan::telemetry::Telemetry;
use std::future::Future;
use std::time::Duration;

pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// An order event for a customer; routed by customer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub customer: String,
    pub number: u32,
}

impl Order {
    pub fn new(customer: &str, number: u32) -> Self {
        Self {
            customer: customer.to_string(),
            number,
        }
    }
}

pub fn order_channel(
    name: &str,
    capacity: usize,
    partitions: usize,
    telemetry: &Telemetry,
) -> PartitionedChannel<String, Order> {
    PartitionedChannel::new(
        &PartitionedChannelConfig::new(name, capacity, partitions),
        |order: &Order| order.customer.clone(),
        telemetry,
    )
    .expect("valid channel config")
}

pub async fn within<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(TEST_TIMEOUT, future)
        .await
        .expect("operation timed out")
}

/// Handler failure used to check that `?` labels failures by type name
#[derive(Debug, thiserror::Error)]
#[error("operation is not valid for order {0}")]
pub struct InvalidOperation(pub u32);
