//! Integration tests for telemetry initialization and span helpers.

use std::time::Duration;

#[test]
fn telemetry_initializes_without_endpoint() {
    // Note: tracing subscriber can only be set once per process.
    let config = mturk_rs::telemetry::TelemetryConfig::new("mturk-test");
    // Err here only means another test already installed a subscriber.
    if let Ok(guard) = mturk_rs::telemetry::init_telemetry(config) {
        assert!(!guard.is_exporting());
        guard.force_flush();
    }
}

#[test]
fn request_span_records_attempts_and_request_id() {
    let span = mturk_rs::telemetry::request::start_request_span(
        "SearchHITs",
        "https://mechanicalturk.sandbox.amazonaws.com/",
    );
    mturk_rs::telemetry::request::record_attempts(&span, 2);
    mturk_rs::telemetry::request::record_request_id(&span, "ece2785b-6292-4b12-a60e-4c34847a7916");
}

#[test]
fn scenario_span_records_outcome() {
    let span = mturk_rs::telemetry::scenario::start_scenario_span("hits", "GetHIT");
    mturk_rs::telemetry::scenario::record_outcome(&span, "passed", None, Duration::from_millis(40));
    mturk_rs::telemetry::scenario::record_outcome(
        &span,
        "failed",
        Some("assertion failed"),
        Duration::from_millis(40),
    );
}

#[test]
fn metric_instruments_build_without_a_provider() {
    use opentelemetry::KeyValue;

    mturk_rs::telemetry::metrics::requests()
        .add(1, &[KeyValue::new("operation", "GetHIT"), KeyValue::new("result", "ok")]);
    mturk_rs::telemetry::metrics::retries().add(1, &[KeyValue::new("operation", "GetHIT")]);
    mturk_rs::telemetry::metrics::request_duration_ms()
        .record(12.5, &[KeyValue::new("operation", "GetHIT")]);
    mturk_rs::telemetry::metrics::scenarios()
        .add(1, &[KeyValue::new("group", "hits"), KeyValue::new("outcome", "passed")]);
}
