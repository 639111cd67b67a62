//! Prometheus metrics for monitoring
//!
//! Exposes metrics for:
//! - Order lifecycle counts
//! - Escrow creation and resolution
//! - Auction rates at acceptance
//! - Error rates

use crate::error::SwapResult;
use crate::events::SwapEvent;

use axum::{routing::get, Router};
use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge_vec, register_histogram_vec, CounterVec, Encoder,
    GaugeVec, HistogramVec, TextEncoder,
};
use std::net::SocketAddr;
use tracing::info;

lazy_static! {
    // Order metrics
    pub static ref ORDERS_CREATED: CounterVec = register_counter_vec!(
        "crosslock_orders_created_total",
        "Total orders created by direction",
        &["direction"]
    ).unwrap();

    pub static ref ORDERS_TERMINAL: CounterVec = register_counter_vec!(
        "crosslock_orders_terminal_total",
        "Total orders reaching a terminal state",
        &["outcome"]
    ).unwrap();

    pub static ref ORDERS_ACTIVE: GaugeVec = register_gauge_vec!(
        "crosslock_orders_active",
        "Currently active orders by status",
        &["status"]
    ).unwrap();

    // Escrow metrics
    pub static ref ESCROWS_CREATED: CounterVec = register_counter_vec!(
        "crosslock_escrows_created_total",
        "Total escrows created",
        &["chain_id"]
    ).unwrap();

    pub static ref ESCROWS_RESOLVED: CounterVec = register_counter_vec!(
        "crosslock_escrows_resolved_total",
        "Total escrows resolved by terminal status",
        &["chain_id", "status"]
    ).unwrap();

    // Auction metrics
    pub static ref ACCEPTED_RATE: HistogramVec = register_histogram_vec!(
        "crosslock_accepted_rate",
        "Auction rate locked at acceptance, in units of the rate scale",
        &[],
        vec![0.25, 0.5, 0.75, 1.0, 1.25, 1.5, 2.0, 3.0, 5.0]
    ).unwrap();

    pub static ref TIME_TO_ACCEPT: HistogramVec = register_histogram_vec!(
        "crosslock_time_to_accept_seconds",
        "Seconds between order creation and resolver acceptance",
        &[],
        vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0]
    ).unwrap();

    // Sweep metrics
    pub static ref ORDERS_SWEPT: CounterVec = register_counter_vec!(
        "crosslock_orders_swept_total",
        "Orders expired by the timeout sweep",
        &[]
    ).unwrap();

    // Error metrics
    pub static ref ERRORS: CounterVec = register_counter_vec!(
        "crosslock_errors_total",
        "Total errors by kind",
        &["kind"]
    ).unwrap();

    // Health metrics
    pub static ref HEALTH_CHECK_SUCCESS: CounterVec = register_counter_vec!(
        "crosslock_health_check_success_total",
        "Total successful health checks",
        &[]
    ).unwrap();

    pub static ref HEALTH_CHECK_FAILURE: CounterVec = register_counter_vec!(
        "crosslock_health_check_failure_total",
        "Total failed health checks",
        &[]
    ).unwrap();
}

/// Prometheus metrics server
pub struct MetricsServer {
    port: u16,
}

impl MetricsServer {
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    pub async fn run(&self) -> SwapResult<()> {
        let app = Router::new().route("/metrics", get(metrics_handler));

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        info!("Starting metrics server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::error::SwapError::Config(e.to_string()))?;
        axum::serve(listener, app)
            .await
            .map_err(|e| crate::error::SwapError::Internal(e.to_string()))?;

        Ok(())
    }
}

async fn metrics_handler() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

// Helper functions to record metrics

pub fn record_event(event: &SwapEvent) {
    match event {
        SwapEvent::OrderCreated { direction, .. } => {
            ORDERS_CREATED.with_label_values(&[direction.as_str()]).inc();
        }
        SwapEvent::EscrowCreated { chain_id, .. } => {
            ESCROWS_CREATED
                .with_label_values(&[&chain_id.to_string()])
                .inc();
        }
        SwapEvent::OrderCompleted { .. } => {
            ORDERS_TERMINAL.with_label_values(&["completed"]).inc();
        }
        SwapEvent::OrderCancelled { .. } => {
            ORDERS_TERMINAL.with_label_values(&["cancelled"]).inc();
        }
        SwapEvent::OrderFailed { .. } => {
            ORDERS_TERMINAL.with_label_values(&["failed"]).inc();
        }
        _ => {}
    }
}

pub fn record_active_orders(status: &str, count: usize) {
    ORDERS_ACTIVE
        .with_label_values(&[status])
        .set(count as f64);
}

pub fn record_escrow_resolved(chain_id: u64, status: &str) {
    ESCROWS_RESOLVED
        .with_label_values(&[&chain_id.to_string(), status])
        .inc();
}

pub fn record_accepted_rate(rate: u128, rate_scale: u128) {
    ACCEPTED_RATE
        .with_label_values(&[])
        .observe(rate as f64 / rate_scale as f64);
}

pub fn record_time_to_accept(secs: u64) {
    TIME_TO_ACCEPT.with_label_values(&[]).observe(secs as f64);
}

pub fn record_sweep(count: usize) {
    ORDERS_SWEPT.with_label_values(&[]).inc_by(count as f64);
}

pub fn record_error(kind: &str) {
    ERRORS.with_label_values(&[kind]).inc();
}

pub fn record_health_check() {
    HEALTH_CHECK_SUCCESS.with_label_values(&[]).inc();
}

pub fn record_health_check_failure() {
    HEALTH_CHECK_FAILURE.with_label_values(&[]).inc();
}
