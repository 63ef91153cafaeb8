//! Application startup and the `run` command

use crate::app::cli::args::{Args, Command, OutputFormat, RunArgs};
use crate::app::cli::config::{AppConfig, ConfigError, LoggingSettings, RunSettings};
use crate::app::cli::display::{self, RunSummary};
use crate::app::workload::{self, SimulatedWorkload, WorkItem};
use crate::channel::{ChannelError, PartitionedChannel, StatsTotals};
use crate::core::error_handling::{log_error_with_context, ContextualError};
use crate::core::logging::init_logging;
use crate::core::shutdown::ShutdownCoordinator;
use crate::core::version;
use crate::telemetry::Telemetry;
use clap::Parser;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Errors that end a `run`
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error("Failed to render metrics: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Failed to render summary: {0}")]
    Output(#[from] serde_json::Error),
}

impl ContextualError for RunError {
    fn is_user_actionable(&self) -> bool {
        match self {
            RunError::Config(e) => e.is_user_actionable(),
            RunError::Channel(e) => e.is_user_actionable(),
            _ => false,
        }
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            RunError::Config(e) => e.user_message(),
            RunError::Channel(e) => e.user_message(),
            _ => None,
        }
    }
}

/// Parse arguments, set up logging and run the selected command
///
/// Returns the process exit code.
pub async fn startup() -> i32 {
    let args = Args::parse();

    // Logging is configured from the file, so file errors go straight to stderr
    let config = match AppConfig::load(args.config_file.as_deref()).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let logging = LoggingSettings::resolve(&config, &args);
    colored::control::set_override(logging.color);
    if let Err(e) = init_logging(
        &logging.level,
        logging.format,
        logging.file.as_deref(),
        logging.color,
    ) {
        eprintln!("Error: {}", e);
        return 1;
    }
    log::debug!(
        "partichan {} ({}, built {})",
        version::version(),
        version::git_hash(),
        version::build_time()
    );

    let shutdown = ShutdownCoordinator::new();
    shutdown.install_signal_handlers();

    let result = match &args.command {
        Command::Run(run_args) => run_command(&config, run_args, &shutdown, logging.color).await,
    };

    match result {
        Ok(true) => 0,
        Ok(false) => 2,
        Err(e) => {
            log_error_with_context(&e, "Running workload");
            1
        }
    }
}

/// Returns whether the run completed cleanly
async fn run_command(
    config: &AppConfig,
    run_args: &RunArgs,
    shutdown: &ShutdownCoordinator,
    use_color: bool,
) -> Result<bool, RunError> {
    let settings = RunSettings::resolve(config, run_args)?;
    let summary = run_workload(&settings, shutdown.child_token(), run_args.show_metrics).await?;

    let rendered = match run_args.output {
        OutputFormat::Text => display::render_text(&summary, use_color),
        OutputFormat::Json => display::render_json(&summary)?,
    };
    println!("{}", rendered);
    Ok(summary.is_success())
}

/// Publish the configured workload and process it to completion
///
/// Cancelling `cancel` stops publishing and the consumer loops; the summary
/// then reports what was processed up to that point. With `capture_metrics`
/// the summary carries the Prometheus text exposition of the run.
pub async fn run_workload(
    settings: &RunSettings,
    cancel: CancellationToken,
    capture_metrics: bool,
) -> Result<RunSummary, RunError> {
    let (telemetry, collector) = Telemetry::with_span_collector();
    let channel = PartitionedChannel::new(&settings.channel, WorkItem::routing_key, &telemetry)?;
    let handler = SimulatedWorkload::new(&settings.workload);

    log::info!(
        "Running {} messages over {} keys through '{}' ({} partitions, capacity {})",
        settings.workload.messages,
        settings.workload.keys,
        settings.channel.name,
        settings.channel.partitions,
        settings.channel.capacity
    );

    let started = Instant::now();
    let processing = channel.start_processing(handler.clone(), &cancel)?;

    let mut interrupted = false;
    for item in workload::generate(&settings.workload) {
        match channel.publish(item, &cancel).await {
            Ok(_) => {}
            Err(e) if e.is_cancelled() => {
                log::warn!("Publishing interrupted by shutdown");
                interrupted = true;
                break;
            }
            Err(e) => {
                processing.stop();
                channel.complete();
                return Err(e.into());
            }
        }
    }
    channel.complete();

    let reports = processing.join().await?;
    let elapsed = started.elapsed();
    interrupted |= cancel.is_cancelled();
    telemetry.flush();

    for report in &reports {
        log::debug!(
            "Partition {}: processed {}, failed {}",
            report.partition,
            report.processed,
            report.failed
        );
    }

    let partitions = channel.stats();
    let totals = StatsTotals::from_stats(&partitions);
    let handled = totals.processed + totals.failed;
    let elapsed_secs = elapsed.as_secs_f64();
    Ok(RunSummary {
        channel: channel.name().to_string(),
        partitions,
        totals,
        elapsed_ms: elapsed_secs * 1000.0,
        throughput_per_sec: if elapsed_secs > 0.0 {
            handled as f64 / elapsed_secs
        } else {
            0.0
        },
        order_violations: handler.order_violations(),
        spans: collector.span_count(),
        interrupted,
        metrics: if capture_metrics {
            Some(telemetry.metrics_text()?)
        } else {
            None
        },
    })
}
