//! Session metrics collector.
//!
//! Created once when the session starts, fed one [`OutcomeRecord`] per
//! reported test phase, and consumed by [`SessionMetricsCollector::finalize`]
//! exactly once. `finalize` takes `self`, so nothing can be recorded after
//! finalizing begins.
//!
//! Delivery is best effort: no error leaves `finalize`.

use std::time::{Instant, SystemTime};

use testgauge_core::labels::parse_extra_labels;
use testgauge_core::naming::{sanitize_label_name, MetricNamer};
use testgauge_core::outcome::{Bucket, OutcomeRecord};
use testgauge_core::summary::OutcomeCounts;
use testgauge_core::Labels;

use crate::config::{BasicAuth, PushConfig};
use crate::hooks::LabelHooks;
use crate::obs::{GaugeVec, InfoMetric, MetricRegistry};
use crate::snapshot::{GaugeNames, MetricSnapshot, SessionEnd};
use crate::transport::{PushRequest, PushTransport};

/// Label carrying the metric name of the test on every outcome sample.
pub const TESTNAME_LABEL: &str = "testname";

/// Sanitized test names per bucket, in arrival order. Duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buckets {
    passed: Vec<String>,
    failed: Vec<String>,
    skipped: Vec<String>,
    errored: Vec<String>,
}

impl Buckets {
    fn push(&mut self, bucket: Bucket, name: String) {
        match bucket {
            Bucket::Passed => self.passed.push(name),
            Bucket::Failed => self.failed.push(name),
            Bucket::Skipped => self.skipped.push(name),
            Bucket::Errored => self.errored.push(name),
        }
    }

    pub fn get(&self, bucket: Bucket) -> &[String] {
        match bucket {
            Bucket::Passed => &self.passed,
            Bucket::Failed => &self.failed,
            Bucket::Skipped => &self.skipped,
            Bucket::Errored => &self.errored,
        }
    }

    pub fn counts(&self) -> OutcomeCounts {
        OutcomeCounts {
            passed: self.passed.len(),
            failed: self.failed.len(),
            skipped: self.skipped.len(),
            errored: self.errored.len(),
        }
    }
}

/// Result of a submission. Failures are already logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Delivered,
    Dropped { reason: String },
}

impl SubmitOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, SubmitOutcome::Delivered)
    }

    /// One-line summary for the end of the run.
    pub fn status_line(&self, gateway_url: &str) -> String {
        match self {
            SubmitOutcome::Delivered => {
                format!("metrics sent on Prometheus PushGateway at {gateway_url}")
            }
            SubmitOutcome::Dropped { .. } => {
                format!("metrics not sent on Prometheus PushGateway at {gateway_url}")
            }
        }
    }
}

pub struct SessionMetricsCollector {
    gateway_url: String,
    job: String,
    namer: MetricNamer,
    extra_labels: Labels,
    auth: Option<BasicAuth>,
    hooks: LabelHooks,
    buckets: Buckets,
    started: Instant,
}

impl SessionMetricsCollector {
    pub fn new(cfg: &PushConfig, hooks: LabelHooks) -> Self {
        let namer = match &cfg.metric_prefix {
            Some(prefix) => MetricNamer::new(prefix.clone()),
            None => MetricNamer::for_job(&cfg.job),
        };
        let extra_labels = cfg
            .extra_labels
            .as_deref()
            .map(parse_extra_labels)
            .map(sanitize_keys)
            .unwrap_or_default();

        tracing::debug!(
            job = %cfg.job,
            prefix = %namer.prefix(),
            extra_labels = extra_labels.len(),
            hooks = hooks.len(),
            "metrics collector ready"
        );

        Self {
            gateway_url: cfg.gateway_url.clone(),
            job: cfg.job.clone(),
            namer,
            extra_labels,
            auth: cfg.basic_auth.clone(),
            hooks,
            buckets: Buckets::default(),
            started: Instant::now(),
        }
    }

    pub fn gateway_url(&self) -> &str {
        &self.gateway_url
    }

    pub fn job(&self) -> &str {
        &self.job
    }

    pub fn extra_labels(&self) -> &Labels {
        &self.extra_labels
    }

    pub fn buckets(&self) -> &Buckets {
        &self.buckets
    }

    pub fn counts(&self) -> OutcomeCounts {
        self.buckets.counts()
    }

    /// `prefix + raw`, restricted to `[A-Za-z0-9_]`.
    pub fn name_for(&self, raw: &str) -> String {
        self.namer.name_for(raw)
    }

    /// Route one outcome. Records without a test identifier are dropped.
    pub fn record(&mut self, rec: &OutcomeRecord) {
        let Some(id) = rec.test_identifier() else {
            tracing::debug!(phase = ?rec.phase, outcome = ?rec.outcome, "ignoring outcome without test location");
            return;
        };
        if let Some(bucket) = rec.bucket() {
            let name = self.name_for(id);
            tracing::trace!(test = %name, ?bucket, "recorded outcome");
            self.buckets.push(bucket, name);
        }
    }

    /// Snapshot the run as it ends now.
    pub fn end_session(&self, exit_code: i32) -> SessionEnd {
        SessionEnd {
            exit_code,
            finished_at: SystemTime::now(),
            duration: self.started.elapsed(),
        }
    }

    /// Build the snapshot for `end`.
    ///
    /// Info label precedence, lowest first: `external`, configured extra
    /// labels, then `status`/`detail`. Does not touch the buckets.
    pub fn build_snapshot(&self, end: &SessionEnd, external: Option<&Labels>) -> MetricSnapshot {
        let counts = self.buckets.counts();

        // Timing gauges carry the configured labels plus the summary.
        let mut run_labels = self.extra_labels.clone();
        run_labels.extend(counts.summary_labels());

        let mut info_labels = external.cloned().map(sanitize_keys).unwrap_or_default();
        info_labels.extend(run_labels.clone());

        let names = GaugeNames {
            passed: self.name_for("passed"),
            failed: self.name_for("failed"),
            skipped: self.name_for("skipped"),
            error: self.name_for("error"),
            last_run_timestamp: self.name_for("last_run_timestamp_seconds"),
            last_success_timestamp: self.name_for("last_success_timestamp_seconds"),
            last_run_duration: self.name_for("last_run_duration_seconds"),
        };

        let mut registry = MetricRegistry::new();
        registry.register_info(InfoMetric::new(
            sanitize_label_name(&self.job),
            "Info test",
            info_labels,
        ));

        let outcome_gauges = [
            (&names.passed, "Number of passed tests", Bucket::Passed),
            (&names.failed, "Number of failed tests", Bucket::Failed),
            (&names.skipped, "Number of skipped tests", Bucket::Skipped),
            (&names.error, "Number of errors tests", Bucket::Errored),
        ];
        for (name, help, bucket) in outcome_gauges {
            let mut gauge = GaugeVec::new(name.clone(), help);
            for test in self.buckets.get(bucket) {
                gauge.inc(self.series_labels(test));
            }
            registry.register_gauge(gauge);
        }

        let mut last_run = GaugeVec::new(
            names.last_run_timestamp.clone(),
            "The Unix timestamp in seconds since the last test job run.",
        );
        last_run.set(run_labels.clone(), end.finished_at_secs());
        registry.register_gauge(last_run);

        let mut last_success = GaugeVec::new(
            names.last_success_timestamp.clone(),
            "The Unix timestamp in seconds since the last successful test job completion.",
        );
        if end.succeeded() {
            last_success.set(run_labels.clone(), end.finished_at_secs());
        }
        registry.register_gauge(last_success);

        let mut duration = GaugeVec::new(
            names.last_run_duration.clone(),
            "The duration in seconds of the last test job run.",
        );
        duration.set(run_labels, end.duration.as_secs_f64());
        registry.register_gauge(duration);

        MetricSnapshot::new(registry, names)
    }

    /// Push `snapshot`. Never fails; a failed push is logged and dropped.
    pub async fn submit<T>(&self, snapshot: &MetricSnapshot, transport: &T) -> SubmitOutcome
    where
        T: PushTransport + ?Sized,
    {
        let req = PushRequest {
            gateway_url: &self.gateway_url,
            job: &self.job,
            body: snapshot.render(),
            auth: self.auth.as_ref(),
        };
        match transport.push(req).await {
            Ok(()) => {
                tracing::info!(gateway = %self.gateway_url, job = %self.job, "metrics pushed");
                SubmitOutcome::Delivered
            }
            Err(e) => {
                tracing::error!(
                    gateway = %self.gateway_url,
                    code = e.code().as_str(),
                    error = %e,
                    "push_to_gateway error"
                );
                SubmitOutcome::Dropped {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// End the session: ask the hooks, build the snapshot, push it.
    pub async fn finalize<T>(self, exit_code: i32, transport: &T) -> SubmitOutcome
    where
        T: PushTransport + ?Sized,
    {
        let end = self.end_session(exit_code);
        let counts = self.buckets.counts();
        let external = self.hooks.first_labels(&counts, &end);
        let snapshot = self.build_snapshot(&end, external.as_ref());
        self.submit(&snapshot, transport).await
    }

    fn series_labels(&self, test: &str) -> Labels {
        let mut labels = self.extra_labels.clone();
        labels.insert(TESTNAME_LABEL.to_string(), test.to_string());
        labels
    }
}

fn sanitize_keys(labels: Labels) -> Labels {
    labels
        .into_iter()
        .map(|(k, v)| (sanitize_label_name(&k), v))
        .collect()
}
