//! Partitioned, instrumented, bounded in-process message channels
//!
//! See [`channel`] for the channel types and [`telemetry`] for the metrics
//! registry and tracer provider they report to.

pub mod app;
pub mod channel;
pub mod core;
pub mod telemetry;
