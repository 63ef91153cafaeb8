//! Channel configuration
//!
//! Both configuration types deserialize from TOML/JSON via serde and are
//! validated by the channel constructors, so an invalid file surfaces as a
//! [`ChannelError::InvalidConfiguration`] rather than a panic.

use crate::channel::error::{ChannelError, ChannelResult};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

pub const DEFAULT_CAPACITY: usize = 1024;
pub const DEFAULT_PARTITIONS: usize = 4;

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_partitions() -> usize {
    DEFAULT_PARTITIONS
}

/// Configuration for a single bounded channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelConfig {
    /// Name used as the `channel` dimension on all telemetry
    pub name: String,
    /// Maximum number of queued messages before publishers wait
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl ChannelConfig {
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            capacity,
        }
    }

    pub fn validate(&self) -> ChannelResult<()> {
        validate_name(&self.name)?;
        validate_capacity(self.capacity)
    }
}

/// Configuration for a partitioned channel
///
/// `capacity` applies to each partition individually.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartitionedChannelConfig {
    pub name: String,
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    #[serde(default = "default_partitions")]
    pub partitions: usize,
}

impl PartitionedChannelConfig {
    pub fn new(name: impl Into<String>, capacity: usize, partitions: usize) -> Self {
        Self {
            name: name.into(),
            capacity,
            partitions,
        }
    }

    pub fn validate(&self) -> ChannelResult<()> {
        validate_name(&self.name)?;
        validate_capacity(self.capacity)?;
        if self.partitions == 0 {
            return Err(ChannelError::invalid(format!(
                "partition count for '{}' must be greater than zero",
                self.name
            )));
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> ChannelResult<()> {
    if name.trim().is_empty() {
        return Err(ChannelError::invalid("channel name must not be empty"));
    }
    Ok(())
}

fn validate_capacity(capacity: usize) -> ChannelResult<()> {
    if capacity == 0 {
        return Err(ChannelError::invalid(
            "channel capacity must be greater than zero",
        ));
    }
    if capacity > Semaphore::MAX_PERMITS {
        return Err(ChannelError::invalid(format!(
            "channel capacity {} exceeds the maximum of {}",
            capacity,
            Semaphore::MAX_PERMITS
        )));
    }
    Ok(())
}
