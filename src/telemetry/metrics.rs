//! Prometheus metrics setup and metric definitions

use anyhow::Context;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return a handle for rendering metrics.
pub fn install_prometheus_recorder() -> anyhow::Result<PrometheusHandle> {
    // Seconds; sub-millisecond buckets for the in-memory backend
    let buckets = [
        0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
    ];

    PrometheusBuilder::new()
        .set_buckets(&buckets)
        .context("failed to set histogram buckets")?
        .install_recorder()
        .context("failed to install Prometheus recorder")
}

/// Register metric descriptions and emit zero values so HELP/TYPE lines show up at startup.
pub fn describe_metrics() {
    describe_counter!(
        "am_management_http_requests_total",
        "Total number of HTTP requests"
    );
    describe_histogram!(
        "am_management_http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_gauge!(
        "am_management_http_requests_in_flight",
        "Number of HTTP requests currently being processed"
    );
    describe_counter!(
        "am_management_audit_events_total",
        "Audit records written, by event type"
    );

    gauge!("am_management_http_requests_in_flight").set(0.0);
    counter!("am_management_audit_events_total", "event_type" => "DOMAIN_CREATED").absolute(0);
}
