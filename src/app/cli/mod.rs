//! Command-line interface: arguments, configuration file and output

pub mod args;
pub mod config;
pub mod display;
