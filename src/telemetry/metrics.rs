//! Per-channel Prometheus instruments

use prometheus::core::Collector;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const NAMESPACE: &str = "partichan";

/// Millisecond buckets shared by both latency histograms
const LATENCY_BUCKETS_MS: &[f64] = &[
    0.5, 1.0, 2.5, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0,
];

/// Label value used for channels that are not part of a partitioned channel
const STANDALONE_PARTITION: &str = "none";

/// Instruments owned by a single channel
///
/// Every instrument carries `channel` and `partition` const labels, so several
/// channels can share one registry without their series colliding. The live
/// queue depth is tracked in an atomic and mirrored onto the gauge.
#[derive(Debug)]
pub struct ChannelMetrics {
    published: IntCounter,
    processed: IntCounter,
    failed: IntCounterVec,
    processing_duration: Histogram,
    queue_wait: Histogram,
    queue_depth_gauge: IntGauge,
    queue_depth: AtomicUsize,
}

impl ChannelMetrics {
    /// Create the instruments and register them with `registry`
    pub fn register(
        registry: &Registry,
        channel: &str,
        partition: Option<usize>,
    ) -> Result<Self, prometheus::Error> {
        let partition_label = partition
            .map(|p| p.to_string())
            .unwrap_or_else(|| STANDALONE_PARTITION.to_string());

        let opts = |name: &str, help: &str| {
            Opts::new(name, help)
                .namespace(NAMESPACE)
                .const_label("channel", channel)
                .const_label("partition", partition_label.as_str())
        };
        let histogram_opts = |name: &str, help: &str| {
            HistogramOpts::new(name, help)
                .namespace(NAMESPACE)
                .const_label("channel", channel)
                .const_label("partition", partition_label.as_str())
                .buckets(LATENCY_BUCKETS_MS.to_vec())
        };

        let published = IntCounter::with_opts(opts(
            "messages_published_total",
            "Messages admitted into the channel",
        ))?;
        let processed = IntCounter::with_opts(opts(
            "messages_processed_total",
            "Messages handled successfully",
        ))?;
        let failed = IntCounterVec::new(
            opts("messages_failed_total", "Messages whose handler failed"),
            &["error_type"],
        )?;
        let processing_duration = Histogram::with_opts(histogram_opts(
            "processing_duration_ms",
            "Handler execution time in milliseconds",
        ))?;
        let queue_wait = Histogram::with_opts(histogram_opts(
            "queue_wait_ms",
            "Time between publish and processing completion in milliseconds",
        ))?;
        let queue_depth_gauge = IntGauge::with_opts(opts(
            "queue_depth",
            "Messages published but not yet processed or failed",
        ))?;

        registry.register(Box::new(published.clone()))?;
        registry.register(Box::new(processed.clone()))?;
        registry.register(Box::new(failed.clone()))?;
        registry.register(Box::new(processing_duration.clone()))?;
        registry.register(Box::new(queue_wait.clone()))?;
        registry.register(Box::new(queue_depth_gauge.clone()))?;

        Ok(Self {
            published,
            processed,
            failed,
            processing_duration,
            queue_wait,
            queue_depth_gauge,
            queue_depth: AtomicUsize::new(0),
        })
    }

    pub fn record_published(&self) {
        self.queue_depth.fetch_add(1, Ordering::AcqRel);
        self.queue_depth_gauge.inc();
        self.published.inc();
    }

    pub fn record_processed(&self, duration: Duration, queue_wait: Duration) {
        self.decrement_queue_depth();
        self.processed.inc();
        self.processing_duration.observe(as_millis_f64(duration));
        self.queue_wait.observe(as_millis_f64(queue_wait));
    }

    pub fn record_failed(&self, error_type: &str) {
        self.decrement_queue_depth();
        self.failed.with_label_values(&[error_type]).inc();
    }

    fn decrement_queue_depth(&self) {
        // Saturate at zero; only mirror onto the gauge when the depth actually moved
        let moved = self
            .queue_depth
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                current.checked_sub(1)
            })
            .is_ok();
        if moved {
            self.queue_depth_gauge.dec();
        } else {
            log::warn!("Queue depth decremented below zero; recording ignored");
        }
    }

    pub fn queue_depth(&self) -> usize {
        self.queue_depth.load(Ordering::Acquire)
    }

    pub fn published(&self) -> u64 {
        self.published.get()
    }

    pub fn processed(&self) -> u64 {
        self.processed.get()
    }

    /// Failures across all error types
    pub fn failed(&self) -> u64 {
        let families = self.failed.collect();
        families
            .iter()
            .flat_map(|family| family.get_metric().iter())
            .map(|metric| metric.get_counter().get_value() as u64)
            .sum()
    }

    pub fn failed_with(&self, error_type: &str) -> u64 {
        self.failed.with_label_values(&[error_type]).get()
    }

    pub fn processing_samples(&self) -> u64 {
        self.processing_duration.get_sample_count()
    }

    pub fn queue_wait_samples(&self) -> u64 {
        self.queue_wait.get_sample_count()
    }
}

fn as_millis_f64(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
