//! Span helpers for the publish and process paths
//!
//! Spans are wrapped in an OpenTelemetry [`Context`] so the process span can
//! be attached to the handler future and become the parent of any span the
//! handler creates.

use crate::channel::HandlerError;
use opentelemetry::trace::{SpanKind, Status, TraceContextExt, Tracer as _};
use opentelemetry::{Context, KeyValue};
use opentelemetry_sdk::trace::Tracer;

pub(crate) const ATTR_SYSTEM: &str = "messaging.system";
pub(crate) const ATTR_DESTINATION: &str = "messaging.destination.name";
pub(crate) const ATTR_PARTITION: &str = "messaging.destination.partition.id";
pub(crate) const ATTR_OPERATION: &str = "messaging.operation";

fn start(
    tracer: &Tracer,
    channel: &str,
    partition: Option<usize>,
    kind: SpanKind,
    operation: &'static str,
) -> Context {
    let mut attributes = vec![
        KeyValue::new(ATTR_SYSTEM, super::INSTRUMENTATION_NAME),
        KeyValue::new(ATTR_DESTINATION, channel.to_string()),
        KeyValue::new(ATTR_OPERATION, operation),
    ];
    if let Some(partition) = partition {
        attributes.push(KeyValue::new(ATTR_PARTITION, partition as i64));
    }

    let span = tracer
        .span_builder(format!("{} {}", channel, operation))
        .with_kind(kind)
        .with_attributes(attributes)
        .start(tracer);
    Context::current_with_span(span)
}

/// Producer span covering one publish call
pub(crate) fn publish_span(tracer: &Tracer, channel: &str, partition: Option<usize>) -> Context {
    start(tracer, channel, partition, SpanKind::Producer, "publish")
}

/// Consumer span covering one handler invocation
pub(crate) fn process_span(tracer: &Tracer, channel: &str, partition: Option<usize>) -> Context {
    start(tracer, channel, partition, SpanKind::Consumer, "process")
}

pub(crate) fn end_ok(cx: &Context) {
    let span = cx.span();
    span.set_status(Status::Ok);
    span.end();
}

/// End the span as failed, attaching the failure as an `exception` event
pub(crate) fn end_failed(cx: &Context, error: &HandlerError) {
    let span = cx.span();
    span.add_event(
        "exception",
        vec![
            KeyValue::new("exception.type", error.category().to_string()),
            KeyValue::new("exception.message", error.message().to_string()),
        ],
    );
    span.set_status(Status::error(error.to_string()));
    span.end();
}

/// End the span as failed with a plain description (publish-side failures)
pub(crate) fn end_with_error(cx: &Context, description: String) {
    let span = cx.span();
    span.set_status(Status::error(description));
    span.end();
}
