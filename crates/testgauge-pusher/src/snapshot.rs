//! Immutable metric snapshot produced once per session.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use testgauge_core::Labels;

use crate::obs::{GaugeVec, MetricRegistry};

/// How the session ended, as seen by the host runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEnd {
    pub exit_code: i32,
    pub finished_at: SystemTime,
    /// Time from collector construction to finalize.
    pub duration: Duration,
}

impl SessionEnd {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }

    /// Seconds since the Unix epoch, fractional.
    pub fn finished_at_secs(&self) -> f64 {
        self.finished_at
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }
}

/// Metric names inside a snapshot, already prefixed and sanitized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GaugeNames {
    pub passed: String,
    pub failed: String,
    pub skipped: String,
    pub error: String,
    pub last_run_timestamp: String,
    pub last_success_timestamp: String,
    pub last_run_duration: String,
}

/// What gets pushed: an info record, four outcome gauges and the run timing
/// gauges. Read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSnapshot {
    registry: MetricRegistry,
    names: GaugeNames,
}

impl MetricSnapshot {
    pub(crate) fn new(registry: MetricRegistry, names: GaugeNames) -> Self {
        Self { registry, names }
    }

    pub fn names(&self) -> &GaugeNames {
        &self.names
    }

    /// Labels of the info record (summary, extra and hook labels).
    pub fn info_labels(&self) -> Labels {
        self.registry
            .info()
            .map(|i| i.labels().clone())
            .unwrap_or_default()
    }

    pub fn info_name(&self) -> Option<String> {
        self.registry.info().map(|i| i.name())
    }

    pub fn gauge(&self, name: &str) -> Option<&GaugeVec> {
        self.registry.gauge(name)
    }

    pub fn passed(&self) -> Option<&GaugeVec> {
        self.gauge(&self.names.passed)
    }

    pub fn failed(&self) -> Option<&GaugeVec> {
        self.gauge(&self.names.failed)
    }

    pub fn skipped(&self) -> Option<&GaugeVec> {
        self.gauge(&self.names.skipped)
    }

    pub fn errored(&self) -> Option<&GaugeVec> {
        self.gauge(&self.names.error)
    }

    /// Text exposition body.
    pub fn render(&self) -> String {
        self.registry.render()
    }
}
