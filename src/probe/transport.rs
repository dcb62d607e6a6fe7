//! Fetch transports.

use futures_util::future::BoxFuture;
use reqwest::header::{HeaderValue, CACHE_CONTROL, USER_AGENT};
use url::Url;

use crate::probe::ProbeError;

/// Performs one lightweight request against the check endpoint.
pub trait Transport: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<(), ProbeError>>;
}

/// HEAD requests over reqwest, one fresh connection per probe.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, ProbeError> {
        // Pooled connections would hide a dropped link.
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| ProbeError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn fetch<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<(), ProbeError>> {
        Box::pin(async move {
            let response = self
                .client
                .head(url.clone())
                .header(USER_AGENT, HeaderValue::from_static("connectivity-monitor"))
                .header(CACHE_CONTROL, HeaderValue::from_static("no-cache"))
                .send()
                .await
                .map_err(|e| ProbeError::Request(e.to_string()))?;

            let status = response.status();
            if status.is_success() {
                Ok(())
            } else {
                Err(ProbeError::Status(status.as_u16()))
            }
        })
    }
}
