//! Prometheus metrics for pvz-service.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter, register_counter_vec, register_histogram_vec, Counter, CounterVec,
    HistogramVec, TextEncoder,
};

/// gRPC request counter by method and status.
pub static GRPC_REQUESTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pvz_grpc_requests_total",
        "Total number of gRPC requests",
        &["method", "status"]
    )
    .expect("Failed to register grpc_requests_total")
});

/// Pickup points created.
pub static PVZ_CREATED: Lazy<Counter> = Lazy::new(|| {
    register_counter!("pvz_created_total", "Total number of pickup points created")
        .expect("Failed to register pvz_created_total")
});

/// Receptions started.
pub static RECEPTIONS_CREATED: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "pvz_receptions_created_total",
        "Total number of receptions started"
    )
    .expect("Failed to register pvz_receptions_created_total")
});

/// Products added to receptions.
pub static PRODUCTS_ADDED: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "pvz_products_added_total",
        "Total number of products added to receptions"
    )
    .expect("Failed to register pvz_products_added_total")
});

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "pvz_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&GRPC_REQUESTS_TOTAL);
    Lazy::force(&PVZ_CREATED);
    Lazy::force(&RECEPTIONS_CREATED);
    Lazy::force(&PRODUCTS_ADDED);
    Lazy::force(&DB_QUERY_DURATION);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
