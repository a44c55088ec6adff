//! Reporter config loader (strict parsing).
//!
//! Settings come from an optional YAML file and the
//! `PROMETHEUS_PUSHGATEWAY_*` environment; the environment wins.

pub mod schema;

use std::fs;
use std::path::Path;

use testgauge_core::error::{Result, TestGaugeError};

pub use schema::{BasicAuth, ExtraLabelsSource, PushConfig, RawSettings};

pub fn load_from_file(path: &Path) -> Result<RawSettings> {
    let s = fs::read_to_string(path).map_err(|e| {
        TestGaugeError::Config(format!("read config {} failed: {e}", path.display()))
    })?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<RawSettings> {
    serde_yaml::from_str(s).map_err(|e| TestGaugeError::Config(format!("invalid yaml: {e}")))
}

/// Build the validated config from `file` (if any) overlaid with variables
/// read through `lookup`.
pub fn load_with<F>(file: Option<&Path>, lookup: F) -> Result<PushConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let base = match file {
        Some(path) => load_from_file(path)?,
        None => RawSettings::default(),
    };
    let env = RawSettings::from_vars(lookup)?;
    base.overlay(env).into_config()
}

/// Build the validated config from `file` and the process environment.
pub fn load(file: Option<&Path>) -> Result<PushConfig> {
    load_with(file, |name| std::env::var(name).ok())
}
