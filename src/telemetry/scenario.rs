//! Span helpers for conformance scenarios.

use std::time::Duration;

use tracing::Span;

/// Start a span for one scenario; `scenario.outcome` is recorded when it ends.
pub fn start_scenario_span(group: &str, name: &str) -> Span {
    tracing::info_span!(
        "mturk.scenario",
        "scenario.group" = group,
        "scenario.name" = name,
        "scenario.outcome" = tracing::field::Empty,
    )
}

/// Record the outcome on the span and emit an event scoped to it. Failures
/// are logged at warn level.
pub fn record_outcome(span: &Span, outcome: &str, detail: Option<&str>, elapsed: Duration) {
    span.record("scenario.outcome", outcome);
    let elapsed_ms = elapsed.as_millis() as u64;
    span.in_scope(|| match (outcome, detail) {
        ("failed", detail) => {
            tracing::warn!(outcome, detail = detail.unwrap_or_default(), elapsed_ms, "scenario finished")
        }
        (_, Some(detail)) => tracing::info!(outcome, detail, elapsed_ms, "scenario finished"),
        (_, None) => tracing::info!(outcome, elapsed_ms, "scenario finished"),
    });
}
