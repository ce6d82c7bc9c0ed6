//! Prometheus Metrics Module
//!
//! Core counters for the limit order engine.
//!
//! ## Metric types
//! - **Counter**: placements, executions, cancellations, redemptions, errors
//! - **Histogram**: executions per trigger, order size
//! - **Gauge**: pending volume per pool and direction
//!
//! ## Usage
//! ```rust,ignore
//! use limit_order_engine::shared::metrics::METRICS;
//!
//! METRICS.orders_placed_total.with_label_values(&["zero_for_one"]).inc();
//! println!("{}", METRICS.export());
//! ```

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge_vec, register_histogram_vec, CounterVec, Encoder,
    GaugeVec, HistogramVec, TextEncoder,
};

lazy_static! {
    /// Global metrics instance
    pub static ref METRICS: Metrics = Metrics::new();
}

pub struct Metrics {
    /// Placements by direction
    pub orders_placed_total: CounterVec,

    /// Executions by direction
    pub orders_executed_total: CounterVec,

    /// Cancellations by direction
    pub orders_cancelled_total: CounterVec,

    /// Redemptions by status (paid / zero_payout)
    pub redemptions_total: CounterVec,

    /// Crossing runs stopped by the per-trigger cap
    pub crossings_deferred_total: CounterVec,

    /// Executions performed by one post-swap trigger
    pub executions_per_trigger: HistogramVec,

    /// Placement size distribution
    pub order_size: HistogramVec,

    /// Pending volume per pool and direction
    pub pending_volume: GaugeVec,

    /// Errors by family
    pub errors_total: CounterVec,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            orders_placed_total: register_counter_vec!(
                "limit_order_engine_orders_placed_total",
                "Total number of limit orders placed",
                &["direction"]
            )
            .expect("metric registration"),

            orders_executed_total: register_counter_vec!(
                "limit_order_engine_orders_executed_total",
                "Total number of resting buckets executed against the pool",
                &["direction"]
            )
            .expect("metric registration"),

            orders_cancelled_total: register_counter_vec!(
                "limit_order_engine_orders_cancelled_total",
                "Total number of cancellations",
                &["direction"]
            )
            .expect("metric registration"),

            redemptions_total: register_counter_vec!(
                "limit_order_engine_redemptions_total",
                "Total number of receipt redemptions",
                &["status"]
            )
            .expect("metric registration"),

            crossings_deferred_total: register_counter_vec!(
                "limit_order_engine_crossings_deferred_total",
                "Crossing runs stopped by the per-trigger cap",
                &["direction"]
            )
            .expect("metric registration"),

            executions_per_trigger: register_histogram_vec!(
                "limit_order_engine_executions_per_trigger",
                "Executions performed by a single post-swap trigger",
                &["direction"],
                vec![0.0, 1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 64.0]
            )
            .expect("metric registration"),

            order_size: register_histogram_vec!(
                "limit_order_engine_order_size",
                "Order size distribution",
                &["direction"],
                vec![1.0, 10.0, 100.0, 1000.0, 10000.0, 100000.0, 1000000.0]
            )
            .expect("metric registration"),

            pending_volume: register_gauge_vec!(
                "limit_order_engine_pending_volume",
                "Unfilled volume resting per pool and direction",
                &["pool", "direction"]
            )
            .expect("metric registration"),

            errors_total: register_counter_vec!(
                "limit_order_engine_errors_total",
                "Total number of rejected or rolled back operations",
                &["error_type"]
            )
            .expect("metric registration"),
        }
    }

    /// Renders every registered metric in the Prometheus text format
    pub fn export(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = prometheus::gather();
        let mut buffer = vec![];
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::warn!("metrics encoding failed: {}", e);
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_global() {
        METRICS
            .orders_placed_total
            .with_label_values(&["zero_for_one"])
            .inc();

        let output = METRICS.export();
        assert!(output.contains("limit_order_engine_orders_placed_total"));
    }

    #[test]
    fn test_histogram_global() {
        METRICS
            .executions_per_trigger
            .with_label_values(&["one_for_zero"])
            .observe(3.0);

        let output = METRICS.export();
        assert!(output.contains("limit_order_engine_executions_per_trigger"));
    }

    #[test]
    fn test_gauge_global() {
        METRICS
            .pending_volume
            .with_label_values(&["test-pool", "zero_for_one"])
            .set(5000.0);

        // shared global, other tests may have moved the value
        let output = METRICS.export();
        assert!(output.contains("limit_order_engine_pending_volume"));
    }
}
