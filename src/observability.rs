use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: API operations handled. Labels: op, status.
pub const REQUESTS_TOTAL: &str = "slipway_requests_total";

/// Counter: holds placed.
pub const HOLDS_PLACED_TOTAL: &str = "slipway_holds_placed_total";

/// Counter: hold attempts rejected because the range was taken.
pub const HOLD_CONFLICTS_TOTAL: &str = "slipway_hold_conflicts_total";

/// Counter: holds confirmed into bookings.
pub const BOOKINGS_CONFIRMED_TOTAL: &str = "slipway_bookings_confirmed_total";

/// Counter: confirmed bookings cancelled by an admin.
pub const BOOKINGS_CANCELLED_TOTAL: &str = "slipway_bookings_cancelled_total";

// ── USE metrics (resource utilization) ──────────────────────────

/// Counter: expired holds physically removed by the sweeper.
pub const HOLDS_SWEPT_TOTAL: &str = "slipway_holds_swept_total";

/// Counter: partner feed failures degraded to an empty busy set.
pub const PARTNER_FEED_FAILURES_TOTAL: &str = "slipway_partner_feed_failures_total";

/// Histogram: WAL group-commit flush duration in seconds.
pub const WAL_FLUSH_DURATION_SECONDS: &str = "slipway_wal_flush_duration_seconds";

/// Histogram: WAL group-commit batch size (events per flush).
pub const WAL_FLUSH_BATCH_SIZE: &str = "slipway_wal_flush_batch_size";

/// Install the Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}
