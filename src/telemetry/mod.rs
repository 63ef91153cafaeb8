//! Telemetry surface for channels
//!
//! A [`Telemetry`] value bundles the two outbound surfaces every channel
//! reports to:
//!
//! - a Prometheus [`Registry`] holding the per-channel counters, histograms
//!   and the queue-depth gauge (see [`ChannelMetrics`])
//! - an OpenTelemetry tracer provider used for producer spans (one per
//!   publish) and consumer spans (one per processed or failed message)
//!
//! Nothing here is process-global. Each `Telemetry` owns its registry and
//! provider, so independently constructed channels never see each other's
//! counters. Cloning a `Telemetry` shares the underlying registry and
//! provider.

mod metrics;
mod span_collector;
pub(crate) mod spans;

pub use metrics::ChannelMetrics;
pub use span_collector::SpanCollector;

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::{SpanProcessor, Tracer, TracerProvider};
use prometheus::{Encoder, Registry, TextEncoder};

/// Instrumentation scope name reported on every span
pub const INSTRUMENTATION_NAME: &str = "partichan";

/// Owned metrics registry and tracer provider shared by a set of channels
#[derive(Clone, Debug)]
pub struct Telemetry {
    registry: Registry,
    provider: TracerProvider,
    tracer: Tracer,
}

impl Telemetry {
    /// Telemetry with a fresh registry and a tracer provider without processors
    ///
    /// Spans are still created (so span-dependent code paths run) but are
    /// discarded when they end.
    pub fn new() -> Self {
        Self::from_provider(TracerProvider::builder().build())
    }

    /// Telemetry whose finished spans are handed to `processor`
    pub fn with_span_processor<P>(processor: P) -> Self
    where
        P: SpanProcessor + 'static,
    {
        Self::from_provider(
            TracerProvider::builder()
                .with_span_processor(processor)
                .build(),
        )
    }

    /// Telemetry reporting finished spans to an in-memory collector
    ///
    /// Returns the collector handle alongside the telemetry.
    pub fn with_span_collector() -> (Self, SpanCollector) {
        let collector = SpanCollector::new();
        (Self::with_span_processor(collector.clone()), collector)
    }

    fn from_provider(provider: TracerProvider) -> Self {
        let tracer = provider.tracer(INSTRUMENTATION_NAME);
        Self {
            registry: Registry::new(),
            provider,
            tracer,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn tracer(&self) -> &Tracer {
        &self.tracer
    }

    /// Render every registered instrument in the Prometheus text format
    pub fn metrics_text(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    /// Flush span processors; failures are logged, not returned
    pub fn flush(&self) {
        for result in self.provider.force_flush() {
            if let Err(e) = result {
                log::warn!("Span processor flush failed: {}", e);
            }
        }
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new()
    }
}
