//! Metric instruments, created from the globally registered `MeterProvider`.

use opentelemetry::metrics::{Counter, Histogram, Meter};

fn meter() -> Meter {
    opentelemetry::global::meter(super::SCOPE)
}

/// Counter: completed requester calls.
/// Labels: `operation`, `result` ("ok" or an error kind).
pub fn requests() -> Counter<u64> {
    meter()
        .u64_counter("mturk.requests")
        .with_description("Requester API calls by outcome")
        .build()
}

/// Counter: retries after a throttled answer.
/// Labels: `operation`.
pub fn retries() -> Counter<u64> {
    meter()
        .u64_counter("mturk.retries")
        .with_description("Requests retried after throttling")
        .build()
}

/// Histogram: wall time of a call including retries, in milliseconds.
/// Labels: `operation`.
pub fn request_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("mturk.request.duration_ms")
        .with_description("Requester API call duration in milliseconds")
        .with_unit("ms")
        .build()
}

/// Counter: suite scenarios by outcome.
/// Labels: `group`, `outcome` ("passed" | "failed" | "skipped").
pub fn scenarios() -> Counter<u64> {
    meter()
        .u64_counter("mturk.scenarios")
        .with_description("Conformance scenarios run")
        .build()
}
