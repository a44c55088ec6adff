//! Owned metrics registry for one push.
//!
//! Gauge and info families with dynamic labels. A registry is built by a
//! single snapshot call and never shared, so samples live in plain ordered maps
//! keyed by their label set; rendering order is deterministic.

use std::collections::BTreeMap;
use std::fmt::Write;

use testgauge_core::Labels;

/// Escape a label value for the text exposition format.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

/// Escape HELP text (backslash and newline only).
fn escape_help(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Integral values keep a trailing `.0`, the way Prometheus client libraries
/// print them.
fn format_value(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

fn render_labels(labels: &Labels) -> String {
    if labels.is_empty() {
        return String::new();
    }
    let body = labels
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect::<Vec<_>>()
        .join(",");
    format!("{{{body}}}")
}

#[derive(Debug, Clone, PartialEq)]
pub struct GaugeVec {
    name: String,
    help: String,
    samples: BTreeMap<Labels, f64>,
}

impl GaugeVec {
    pub fn new(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            samples: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Increment by 1.
    pub fn inc(&mut self, labels: Labels) {
        self.add(labels, 1.0);
    }

    /// Add an arbitrary delta. Samples with equal label sets accumulate.
    pub fn add(&mut self, labels: Labels, v: f64) {
        *self.samples.entry(labels).or_insert(0.0) += v;
    }

    /// Overwrite the sample for `labels`.
    pub fn set(&mut self, labels: Labels, v: f64) {
        self.samples.insert(labels, v);
    }

    pub fn get(&self, labels: &Labels) -> Option<f64> {
        self.samples.get(labels).copied()
    }

    pub fn samples(&self) -> impl Iterator<Item = (&Labels, f64)> {
        self.samples.iter().map(|(k, v)| (k, *v))
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Render in Prometheus text exposition format.
    fn render(&self, out: &mut String) {
        let _ = writeln!(out, "# HELP {} {}", self.name, escape_help(&self.help));
        let _ = writeln!(out, "# TYPE {} gauge", self.name);
        for (labels, v) in &self.samples {
            let _ = writeln!(out, "{}{} {}", self.name, render_labels(labels), format_value(*v));
        }
    }
}

/// An info record: a constant `1` whose labels carry the metadata.
///
/// Exposed as `<name>_info`, typed `gauge` in the 0.0.4 text format.
#[derive(Debug, Clone, PartialEq)]
pub struct InfoMetric {
    name: String,
    help: String,
    labels: Labels,
}

impl InfoMetric {
    pub fn new(name: impl Into<String>, help: impl Into<String>, labels: Labels) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            labels,
        }
    }

    /// Full series name, including the `_info` suffix.
    pub fn name(&self) -> String {
        format!("{}_info", self.name)
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    fn render(&self, out: &mut String) {
        let name = self.name();
        let _ = writeln!(out, "# HELP {} {}", name, escape_help(&self.help));
        let _ = writeln!(out, "# TYPE {} gauge", name);
        let _ = writeln!(out, "{}{} 1.0", name, render_labels(&self.labels));
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Family {
    Info(InfoMetric),
    Gauge(GaugeVec),
}

/// Registration-ordered collection of metric families.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricRegistry {
    families: Vec<Family>,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_info(&mut self, info: InfoMetric) {
        self.families.push(Family::Info(info));
    }

    pub fn register_gauge(&mut self, gauge: GaugeVec) {
        self.families.push(Family::Gauge(gauge));
    }

    pub fn info(&self) -> Option<&InfoMetric> {
        self.families.iter().find_map(|f| match f {
            Family::Info(i) => Some(i),
            Family::Gauge(_) => None,
        })
    }

    pub fn gauge(&self, name: &str) -> Option<&GaugeVec> {
        self.families.iter().find_map(|f| match f {
            Family::Gauge(g) if g.name == name => Some(g),
            _ => None,
        })
    }

    pub fn gauges(&self) -> impl Iterator<Item = &GaugeVec> {
        self.families.iter().filter_map(|f| match f {
            Family::Gauge(g) => Some(g),
            Family::Info(_) => None,
        })
    }

    /// Render every family in registration order.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for family in &self.families {
            match family {
                Family::Info(i) => i.render(&mut out),
                Family::Gauge(g) => g.render(&mut out),
            }
        }
        out
    }
}
