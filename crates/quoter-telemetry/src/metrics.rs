//! Prometheus metrics for the quoting strategy.
//!
//! Covers the decision core only:
//! - Order actions sent per kind and side
//! - Cycle outcomes (completed, skipped on bad book, ...)
//! - Confirmation routing outcomes
//! - Net position and tick-to-order latency
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. A registration failure
//! means duplicate metric names, a startup bug that should crash immediately.
//! These panics only occur during static initialization, never at runtime.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram, register_int_gauge, CounterVec, Encoder, Histogram,
    IntGauge, TextEncoder,
};

use crate::error::{TelemetryError, TelemetryResult};

/// Order actions the handle reported as sent.
/// Labels: action (new/replace/cancel), side (BUY/SELL)
pub static ORDER_ACTIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "quoter_order_actions_total",
        "Order actions sent to the order handle",
        &["action", "side"]
    )
    .unwrap()
});

/// Order actions the handle refused to send.
pub static ORDER_ACTIONS_NOT_SENT_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "quoter_order_actions_not_sent_total",
        "Order actions the order handle reported as not sent",
        &["action", "side"]
    )
    .unwrap()
});

/// Market-data cycles by outcome.
/// Labels: outcome (completed/invalid_book/foreign_contract/not_running/failed)
pub static CYCLES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "quoter_cycles_total",
        "Market-data cycles by outcome",
        &["outcome"]
    )
    .unwrap()
});

/// Confirmations by routing outcome.
/// Labels: outcome (applied/rejected/unroutable)
pub static CONFIRMATIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "quoter_confirmations_total",
        "Order confirmations by routing outcome",
        &["outcome"]
    )
    .unwrap()
});

/// Net position in exchange units.
pub static NET_POSITION: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("quoter_net_position", "Net position in exchange units").unwrap()
});

/// Wall time from market-data arrival to the end of reconciliation.
pub static TICK_TO_ORDER_US: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "quoter_tick_to_order_us",
        "Tick-to-order latency in microseconds",
        vec![1.0, 2.0, 5.0, 10.0, 20.0, 50.0, 100.0, 200.0, 500.0, 1000.0]
    )
    .unwrap()
});

/// Metrics facade.
pub struct Metrics;

impl Metrics {
    /// Record an order action the handle accepted.
    pub fn order_action_sent(action: &str, side: &str) {
        ORDER_ACTIONS_TOTAL.with_label_values(&[action, side]).inc();
    }

    /// Record an order action the handle refused.
    pub fn order_action_not_sent(action: &str, side: &str) {
        ORDER_ACTIONS_NOT_SENT_TOTAL
            .with_label_values(&[action, side])
            .inc();
    }

    pub fn cycle(outcome: &str) {
        CYCLES_TOTAL.with_label_values(&[outcome]).inc();
    }

    pub fn confirmation(outcome: &str) {
        CONFIRMATIONS_TOTAL.with_label_values(&[outcome]).inc();
    }

    pub fn net_position(qty: i64) {
        NET_POSITION.set(qty);
    }

    pub fn tick_to_order(latency_us: f64) {
        TICK_TO_ORDER_US.observe(latency_us);
    }

    /// Render the default registry in Prometheus text format.
    pub fn render() -> TelemetryResult<String> {
        let families = prometheus::gather();
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&families, &mut buf)
            .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
        String::from_utf8(buf).map_err(|e| TelemetryError::Metrics(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_contains_recorded_metrics() {
        Metrics::order_action_sent("new", "BUY");
        Metrics::cycle("completed");
        Metrics::net_position(40);

        let text = Metrics::render().unwrap();
        assert!(text.contains("quoter_order_actions_total"));
        assert!(text.contains(r#"side="BUY""#));
        assert!(text.contains("quoter_cycles_total"));
        assert!(text.contains("quoter_net_position"));
    }
}
