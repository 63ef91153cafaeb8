//! Partitioned, Instrumented, Bounded Channels
//!
//! In-process message channels with bounded-capacity backpressure, per-key
//! ordering across concurrently processed partitions, isolated per-message
//! failure handling, and built-in telemetry.
//!
//! # Overview
//!
//! - **[`Channel`]**: a bounded FIFO of [`Envelope`]s. Publishing into a full
//!   channel waits for a reader to free a slot.
//! - **[`PartitionedChannel`]**: N independent channels; each message is
//!   routed to one of them by hashing a caller-supplied key.
//! - **[`MessageHandler`]**: the consumer callback run by
//!   [`PartitionedChannel::start_processing`], one loop per partition.
//!
//! Every channel registers its counters, histograms and queue-depth gauge
//! with the [`Telemetry`](crate::telemetry::Telemetry) it was built with,
//! and emits a producer span per publish and a consumer span per handled
//! message.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐   ┌────────────┐
//! │ Producer A │   │ Producer B │
//! └─────┬──────┘   └─────┬──────┘
//!       │ publish        │ publish
//!       ▼                ▼
//! ┌──────────────────────────────────────────────┐
//! │ PartitionedChannel   hash(key) % N           │
//! │  ┌──────────┐   ┌──────────┐   ┌──────────┐  │
//! │  │ part 0   │   │ part 1   │   │ part N-1 │  │
//! │  │ ▣▣▣□□□   │   │ ▣□□□□□   │   │ ▣▣▣▣▣▣   │◄─┼── full: publisher waits
//! │  └────┬─────┘   └────┬─────┘   └────┬─────┘  │
//! └───────┼──────────────┼──────────────┼────────┘
//!         ▼              ▼              ▼
//!    ┌─────────┐    ┌─────────┐    ┌─────────┐
//!    │ loop 0  │    │ loop 1  │    │ loop N-1│   one handler call in flight
//!    └─────────┘    └─────────┘    └─────────┘   per partition
//! ```

mod bounded;
mod config;
mod consumer;
mod envelope;
mod error;
mod handler;
mod partitioned;
mod reader;
mod stats;

pub use bounded::Channel;
pub use config::{
    ChannelConfig, PartitionedChannelConfig, DEFAULT_CAPACITY, DEFAULT_PARTITIONS,
};
pub use consumer::{LoopState, PartitionReport, ProcessingHandle};
pub use envelope::Envelope;
pub use error::{ChannelError, ChannelResult, HandlerError};
pub use handler::MessageHandler;
pub use partitioned::PartitionedChannel;
pub use reader::ChannelReader;
pub use stats::{ChannelStats, StatsTotals};

#[cfg(test)]
mod tests;
