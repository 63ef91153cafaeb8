//! The `partichan` application
//!
//! Everything here is a consumer of the [`channel`](crate::channel) library:
//! a synthetic producer publishes keyed work items, a simulated handler
//! processes them, and the run ends with a per-partition summary.

pub mod cli;
pub mod startup;
pub mod workload;
