use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: appointments admitted (created or rescheduled).
pub const ADMISSIONS_TOTAL: &str = "petsched_admissions_total";

/// Counter: admissions rejected by the conflict/capacity rule.
pub const ADMISSIONS_REJECTED_TOTAL: &str = "petsched_admissions_rejected_total";

/// Counter: appointments canceled.
pub const CANCELLATIONS_TOTAL: &str = "petsched_cancellations_total";

/// Counter: availability computations served.
pub const AVAILABILITY_QUERIES_TOTAL: &str = "petsched_availability_queries_total";

/// Histogram: availability computation latency in seconds.
pub const AVAILABILITY_DURATION_SECONDS: &str = "petsched_availability_duration_seconds";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: tenant-day admission gates currently tracked.
pub const DAY_GATES_ACTIVE: &str = "petsched_day_gates_active";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}
