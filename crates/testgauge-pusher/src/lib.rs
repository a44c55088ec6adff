//! testgauge pusher library entry.
//!
//! Wires config loading, the session collector, snapshot rendering and the
//! Pushgateway transport together. Consumed by the `testgauge` binary and by
//! integration tests.

pub mod adapters;
pub mod collector;
pub mod config;
pub mod hooks;
pub mod obs;
pub mod runner;
pub mod snapshot;
pub mod transport;

pub use collector::{SessionMetricsCollector, SubmitOutcome};
pub use config::PushConfig;
pub use hooks::{LabelHook, LabelHooks};
pub use snapshot::{MetricSnapshot, SessionEnd};
