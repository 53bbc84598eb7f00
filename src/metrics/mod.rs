/*!
 * # Metrics Module
 *
 * Business counters for the order pipeline, kept in a dedicated prometheus
 * registry and exposed in text format at `/metrics`.
 */

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Failed to export metrics: {0}")]
    ExportError(String),
}

fn counter(name: &str, help: &str) -> IntCounter {
    let counter = IntCounter::new(name, help).expect("metric can be created");
    REGISTRY
        .register(Box::new(counter.clone()))
        .expect("metric can be registered");
    counter
}

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref ORDERS_CREATED: IntCounter =
        counter("orders_created_total", "Total number of orders created");
    pub static ref ORDER_CREATION_FAILURES: IntCounter = counter(
        "order_creation_failures_total",
        "Total number of rejected or failed order creations"
    );
    pub static ref PROMO_REDEMPTIONS: IntCounter =
        counter("promo_redemptions_total", "Total number of promo redemptions");
    pub static ref STOCK_REJECTIONS: IntCounter = counter(
        "stock_reservation_rejections_total",
        "Reservations refused for insufficient stock"
    );
    pub static ref ORDERS_DELIVERED: IntCounter =
        counter("orders_delivered_total", "Total number of orders marked delivered");
    pub static ref CONCURRENCY_CONFLICTS: IntCounter = counter(
        "order_concurrency_conflicts_total",
        "Order transitions that lost an optimistic version check"
    );
    pub static ref ORDER_TRANSITIONS: IntCounterVec = {
        let vec = IntCounterVec::new(
            Opts::new("order_status_transitions_total", "Order status transitions"),
            &["to"],
        )
        .expect("metric can be created");
        REGISTRY
            .register(Box::new(vec.clone()))
            .expect("metric can be registered");
        vec
    };
}

/// Renders every registered metric in the prometheus text format.
pub async fn metrics_handler() -> Result<String, MetricsError> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&REGISTRY.gather(), &mut buffer)
        .map_err(|e| MetricsError::ExportError(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| MetricsError::ExportError(e.to_string()))
}
