use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use testgauge_core::error::{Result, TestGaugeError};

use crate::transport::push_url;

pub const ENV_URL: &str = "PROMETHEUS_PUSHGATEWAY_URL";
pub const ENV_JOB: &str = "PROMETHEUS_PUSHGATEWAY_JOB";
pub const ENV_METRIC_PREFIX: &str = "PROMETHEUS_PUSHGATEWAY_METRIC_PREFIX";
pub const ENV_EXTRA_LABEL: &str = "PROMETHEUS_PUSHGATEWAY_EXTRA_LABEL";
pub const ENV_BASIC_AUTH: &str = "PROMETHEUS_PUSHGATEWAY_BASIC_AUTH";
pub const ENV_USERNAME: &str = "PROMETHEUS_PUSHGATEWAY_USERNAME";
pub const ENV_PASSWORD: &str = "PROMETHEUS_PUSHGATEWAY_PASSWORD";
pub const ENV_TIMEOUT_SECS: &str = "PROMETHEUS_PUSHGATEWAY_TIMEOUT_SECS";

/// Validated reporter configuration. Built once before the session starts.
#[derive(Debug, Clone)]
pub struct PushConfig {
    pub gateway_url: String,
    pub job: String,
    pub metric_prefix: Option<String>,
    /// Still encoded; the collector parses it and falls back to no labels.
    pub extra_labels: Option<String>,
    pub basic_auth: Option<BasicAuth>,
    pub timeout: Duration,
}

#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Extra labels as written in a config file: the encoded string the
/// environment variable carries, or any YAML value. Structured values are
/// re-encoded and judged by `parse_extra_labels` like the string form, so a
/// bad mapping degrades to no labels instead of rejecting the config.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ExtraLabelsSource {
    Encoded(String),
    Structured(serde_json::Value),
}

impl ExtraLabelsSource {
    fn into_encoded(self) -> String {
        match self {
            ExtraLabelsSource::Encoded(s) => s,
            ExtraLabelsSource::Structured(v) => serde_json::to_string(&v).unwrap_or_default(),
        }
    }
}

/// Unvalidated settings, from a YAML file and/or the environment.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawSettings {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub job: Option<String>,
    #[serde(default)]
    pub metric_prefix: Option<String>,
    #[serde(default)]
    pub extra_labels: Option<ExtraLabelsSource>,
    #[serde(default)]
    pub basic_auth: Option<bool>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl RawSettings {
    /// Read settings through `lookup`, which maps an environment variable
    /// name to its value. Tests pass a closure over a map instead of touching
    /// the process environment.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout_secs = match non_empty(lookup(ENV_TIMEOUT_SECS)) {
            Some(s) => Some(s.trim().parse::<u64>().map_err(|_| {
                TestGaugeError::Config(format!("{ENV_TIMEOUT_SECS} must be an integer, got {s:?}"))
            })?),
            None => None,
        };

        Ok(Self {
            url: non_empty(lookup(ENV_URL)),
            job: non_empty(lookup(ENV_JOB)),
            metric_prefix: non_empty(lookup(ENV_METRIC_PREFIX)),
            extra_labels: non_empty(lookup(ENV_EXTRA_LABEL)).map(ExtraLabelsSource::Encoded),
            basic_auth: non_empty(lookup(ENV_BASIC_AUTH)).map(|v| parse_toggle(&v)),
            username: non_empty(lookup(ENV_USERNAME)),
            password: non_empty(lookup(ENV_PASSWORD)),
            timeout_secs,
        })
    }

    /// Values present in `over` win.
    pub fn overlay(self, over: RawSettings) -> RawSettings {
        RawSettings {
            url: over.url.or(self.url),
            job: over.job.or(self.job),
            metric_prefix: over.metric_prefix.or(self.metric_prefix),
            extra_labels: over.extra_labels.or(self.extra_labels),
            basic_auth: over.basic_auth.or(self.basic_auth),
            username: over.username.or(self.username),
            password: over.password.or(self.password),
            timeout_secs: over.timeout_secs.or(self.timeout_secs),
        }
    }

    /// Validate and build the final config.
    pub fn into_config(self) -> Result<PushConfig> {
        let gateway_url = non_empty(self.url)
            .ok_or_else(|| TestGaugeError::Config(format!("{ENV_URL} must be set")))?;
        let job = non_empty(self.job)
            .ok_or_else(|| TestGaugeError::Config(format!("{ENV_JOB} must be set")))?;

        let basic_auth = if self.basic_auth.unwrap_or(false) {
            match (non_empty(self.username), non_empty(self.password)) {
                (Some(username), Some(password)) => Some(BasicAuth { username, password }),
                _ => {
                    return Err(TestGaugeError::Config(format!(
                        "basic auth is enabled; {ENV_USERNAME} and {ENV_PASSWORD} must both be set"
                    )))
                }
            }
        } else {
            None
        };

        let timeout_secs = self.timeout_secs.unwrap_or_else(default_timeout_secs);
        if !(1..=300).contains(&timeout_secs) {
            return Err(TestGaugeError::Config(
                "timeout_secs must be between 1 and 300".into(),
            ));
        }

        // Reject URLs the transport could never push to.
        push_url(&gateway_url, &job)?;

        Ok(PushConfig {
            gateway_url,
            job,
            metric_prefix: non_empty(self.metric_prefix),
            extra_labels: self
                .extra_labels
                .map(ExtraLabelsSource::into_encoded)
                .filter(|s| !s.trim().is_empty()),
            basic_auth,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Boolean-ish toggle. Empty, `false`, `0`, `no` and `off` disable; anything
/// else enables.
pub fn parse_toggle(raw: &str) -> bool {
    !matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "" | "false" | "0" | "no" | "off"
    )
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}

fn default_timeout_secs() -> u64 {
    30
}
