//! Pushgateway transport.
//!
//! A push replaces every metric of the job's grouping key:
//! `PUT <gateway>/metrics/job/<job>` with a text exposition body.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;

use testgauge_core::error::{Result, TestGaugeError};

use crate::config::BasicAuth;

/// Content type of the Prometheus text exposition format.
pub const CONTENT_TYPE_TEXT: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Longest response body kept in a rejection error.
const MAX_ERROR_BODY: usize = 512;

/// One push of a rendered snapshot.
#[derive(Debug, Clone)]
pub struct PushRequest<'a> {
    pub gateway_url: &'a str,
    pub job: &'a str,
    pub body: String,
    pub auth: Option<&'a BasicAuth>,
}

/// Where snapshots go. The HTTP implementation is [`HttpPushTransport`];
/// tests substitute their own.
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn push(&self, req: PushRequest<'_>) -> Result<()>;
}

#[async_trait]
impl<T: PushTransport + ?Sized> PushTransport for Arc<T> {
    async fn push(&self, req: PushRequest<'_>) -> Result<()> {
        (**self).push(req).await
    }
}

/// Build the push URL for `job`.
///
/// A gateway URL without a scheme is taken as `http://`. Jobs containing `/`
/// use the Pushgateway's base64 grouping-key form (`job@base64/<value>`).
pub fn push_url(gateway_url: &str, job: &str) -> Result<Url> {
    let base = if gateway_url.contains("://") {
        gateway_url.to_string()
    } else {
        format!("http://{gateway_url}")
    };
    let mut url = Url::parse(&base)
        .map_err(|e| TestGaugeError::Config(format!("invalid gateway url {gateway_url:?}: {e}")))?;

    let (key, value) = if job.contains('/') {
        ("job@base64", URL_SAFE.encode(job))
    } else {
        ("job", job.to_string())
    };

    url.path_segments_mut()
        .map_err(|_| {
            TestGaugeError::Config(format!("gateway url {gateway_url:?} cannot carry a path"))
        })?
        .pop_if_empty()
        .extend(["metrics", key, value.as_str()]);
    Ok(url)
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpPushTransport {
    client: reqwest::Client,
}

impl HttpPushTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TestGaugeError::Internal(format!("http client error: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PushTransport for HttpPushTransport {
    async fn push(&self, req: PushRequest<'_>) -> Result<()> {
        let url = push_url(req.gateway_url, req.job)?;
        tracing::debug!(%url, bytes = req.body.len(), "pushing metrics");

        let mut builder = self
            .client
            .put(url)
            .header(CONTENT_TYPE, CONTENT_TYPE_TEXT)
            .body(req.body);
        if let Some(auth) = req.auth {
            builder = builder.basic_auth(&auth.username, Some(&auth.password));
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| TestGaugeError::PushFailed(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let mut body = resp.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        Err(TestGaugeError::PushRejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn url_for_plain_job() {
        let url = push_url("http://gw:9091", "nightly").unwrap();
        assert_eq!(url.as_str(), "http://gw:9091/metrics/job/nightly");
    }

    #[test]
    fn url_keeps_base_path_and_adds_scheme() {
        let url = push_url("gw.internal:9091/push/", "ci").unwrap();
        assert_eq!(url.as_str(), "http://gw.internal:9091/push/metrics/job/ci");
    }

    #[test]
    fn url_encodes_reserved_characters() {
        let url = push_url("https://gw", "e2e tests").unwrap();
        assert_eq!(url.as_str(), "https://gw/metrics/job/e2e%20tests");
    }

    #[test]
    fn job_with_slash_uses_base64_key() {
        let url = push_url("http://gw", "team/e2e").unwrap();
        assert_eq!(url.as_str(), "http://gw/metrics/job@base64/dGVhbS9lMmU=");
    }

    #[test]
    fn rejects_unusable_urls() {
        assert!(push_url("http://", "job").is_err());
    }
}
