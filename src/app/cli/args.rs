//! Command-line arguments
//!
//! Every workload and channel option is optional here; unset values fall
//! back to the configuration file and then to built-in defaults (see
//! [`config`](super::config)).

use crate::core::logging::LogFormat;
use crate::core::styles::clap_styles;
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "partichan")]
#[command(about = "Drive a partitioned, instrumented channel with a synthetic workload")]
#[command(version, long_version = crate::core::version::long_version())]
#[command(styles = clap_styles())]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Log level spec (e.g. "info" or "warn,partichan::channel=debug")
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(short = 'o', long = "log-format", value_name = "FORMAT", global = true)]
    pub log_format: Option<LogFormat>,

    /// Write logs to this file instead of stderr
    #[arg(short = 'f', long = "log-file", value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// Force coloured output
    #[arg(long = "color", global = true, conflicts_with = "no_color")]
    pub color: bool,

    /// Disable coloured output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Publish a synthetic keyed workload and process it to completion
    Run(RunArgs),
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct RunArgs {
    /// Channel name used on metrics and spans
    #[arg(short = 'n', long = "name", value_name = "NAME")]
    pub name: Option<String>,

    /// Number of partitions
    #[arg(short = 'p', long = "partitions", value_name = "COUNT")]
    pub partitions: Option<usize>,

    /// Capacity of each partition
    #[arg(short = 'C', long = "capacity", value_name = "COUNT")]
    pub capacity: Option<usize>,

    /// Number of messages to publish
    #[arg(short = 'm', long = "messages", value_name = "COUNT")]
    pub messages: Option<u64>,

    /// Number of distinct message keys
    #[arg(short = 'k', long = "keys", value_name = "COUNT")]
    pub keys: Option<u64>,

    /// Artificial handler latency per message, in milliseconds
    #[arg(short = 'L', long = "latency-ms", value_name = "MS")]
    pub latency_ms: Option<u64>,

    /// Fail every Nth message (0 disables failure injection)
    #[arg(short = 'F', long = "fail-every", value_name = "N")]
    pub fail_every: Option<u64>,

    /// Summary output format
    #[arg(long = "output", value_name = "FORMAT", default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Append the Prometheus text exposition to the summary
    #[arg(long = "show-metrics")]
    pub show_metrics: bool,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, strum_macros::Display,
)]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
