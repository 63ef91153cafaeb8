//! Scenario test modules

pub mod backpressure;
pub mod failure_isolation;
pub mod per_key_ordering;
pub mod throughput;
