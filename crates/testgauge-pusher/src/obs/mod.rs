//! Metric families and Prometheus text rendering (dependency-free).
//!
//! Only what a push needs: gauges and an info record.

pub mod metrics;

pub use metrics::{GaugeVec, InfoMetric, MetricRegistry};
