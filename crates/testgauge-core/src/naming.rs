//! Metric and label naming.
//!
//! Prometheus metric names are restricted to `[a-zA-Z_:][a-zA-Z0-9_:]*` and
//! label names to `[a-zA-Z_][a-zA-Z0-9_]*`. Test identifiers routinely contain
//! `::`, `.`, `[` and friends, so every character outside `[A-Za-z0-9_]` is
//! replaced by `_`. See
//! <https://prometheus.io/docs/concepts/data_model/#metric-names-and-labels>.

/// Replace every character outside `[A-Za-z0-9_]` with `_`.
///
/// Works per `char`, so a multi-byte character becomes a single `_`.
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Sanitize a label name. Label names may not start with a digit.
pub fn sanitize_label_name(raw: &str) -> String {
    leading_underscore(sanitize(raw))
}

/// Sanitize a metric name. Like label names, metric names may not start
/// with a digit.
pub fn sanitize_metric_name(raw: &str) -> String {
    leading_underscore(sanitize(raw))
}

fn leading_underscore(s: String) -> String {
    match s.chars().next() {
        None => "_".to_string(),
        Some(c) if c.is_ascii_digit() => format!("_{s}"),
        Some(_) => s,
    }
}

/// Builds prefixed metric names for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricNamer {
    prefix: String,
}

impl MetricNamer {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Default prefix for a job: `<job>_`.
    pub fn for_job(job: &str) -> Self {
        Self::new(format!("{job}_"))
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// `prefix + raw`, sanitized. A leading digit gets a `_` in front.
    pub fn name_for(&self, raw: &str) -> String {
        let mut unsanitized = String::with_capacity(self.prefix.len() + raw.len());
        unsanitized.push_str(&self.prefix);
        unsanitized.push_str(raw);
        sanitize_metric_name(&unsanitized)
    }
}
