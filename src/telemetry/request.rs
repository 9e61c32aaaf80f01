//! Span helpers for requester calls.

use tracing::Span;

/// Start a span for one call. `mturk.attempts` and `mturk.request_id` are
/// filled in once the call finishes.
pub fn start_request_span(operation: &str, endpoint: &str) -> Span {
    tracing::info_span!(
        "mturk.request",
        "mturk.operation" = operation,
        "mturk.endpoint" = endpoint,
        "mturk.attempts" = tracing::field::Empty,
        "mturk.request_id" = tracing::field::Empty,
    )
}

pub fn record_attempts(span: &Span, attempts: u32) {
    span.record("mturk.attempts", attempts);
}

pub fn record_request_id(span: &Span, request_id: &str) {
    span.record("mturk.request_id", request_id);
}
