//! In-memory span collection
//!
//! A span processor that keeps every finished span in memory. Used by the
//! test suites to assert on the tracing contract and by the `run` command to
//! report how many spans a workload produced.

use crate::core::sync::lock_or_recover;
use opentelemetry::trace::{SpanKind, Status, TraceResult};
use opentelemetry_sdk::export::trace::SpanData;
use opentelemetry_sdk::trace::{Span, SpanProcessor};
use std::sync::{Arc, Mutex};

/// Span processor collecting finished spans; clones share the same storage
#[derive(Clone, Default)]
pub struct SpanCollector {
    spans: Arc<Mutex<Vec<SpanData>>>,
}

impl std::fmt::Debug for SpanCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpanCollector")
            .field("span_count", &self.span_count())
            .finish()
    }
}

impl SpanCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all collected spans
    pub fn spans(&self) -> Vec<SpanData> {
        lock_or_recover(&self.spans, "span collector").clone()
    }

    pub fn span_count(&self) -> usize {
        lock_or_recover(&self.spans, "span collector").len()
    }

    /// Number of collected spans of the given kind
    pub fn count_kind(&self, kind: SpanKind) -> usize {
        lock_or_recover(&self.spans, "span collector")
            .iter()
            .filter(|span| span.span_kind == kind)
            .count()
    }

    /// Number of collected spans that finished with an error status
    pub fn error_count(&self) -> usize {
        lock_or_recover(&self.spans, "span collector")
            .iter()
            .filter(|span| matches!(span.status, Status::Error { .. }))
            .count()
    }

    pub fn clear(&self) {
        lock_or_recover(&self.spans, "span collector").clear();
    }
}

impl SpanProcessor for SpanCollector {
    fn on_start(&self, _span: &mut Span, _cx: &opentelemetry::Context) {}

    fn on_end(&self, span: SpanData) {
        log::trace!("Collecting span: {}", span.name);
        lock_or_recover(&self.spans, "span collector").push(span);
    }

    fn force_flush(&self) -> TraceResult<()> {
        Ok(())
    }

    fn shutdown(&mut self) -> TraceResult<()> {
        log::debug!("Span collector shut down with {} spans", self.span_count());
        Ok(())
    }
}
