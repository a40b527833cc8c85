//! Reachability Prober
//!
//! Tries each endpoint in order with a bounded request and reports healthy
//! on the first `200 OK`. Transport errors, timeouts and other statuses are
//! logged at debug and the next endpoint is tried. Only when every endpoint
//! fails is the verdict unhealthy.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

/// Source of the per-cycle healthy/unhealthy verdict
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self) -> bool;
}

/// HTTP GET prober over an ordered endpoint list
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: reqwest::Client,
    endpoints: Vec<String>,
    timeout: Duration,
}

impl HttpProber {
    pub fn new(endpoints: Vec<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self::with_client(client, endpoints, timeout))
    }

    pub fn with_client(client: reqwest::Client, endpoints: Vec<String>, timeout: Duration) -> Self {
        Self {
            client,
            endpoints,
            timeout,
        }
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    async fn check(&self, url: &str) -> Result<(), String> {
        let resp = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        match resp.status() {
            StatusCode::OK => Ok(()),
            other => Err(format!("unexpected status {other}")),
        }
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self) -> bool {
        for url in &self.endpoints {
            match self.check(url).await {
                Ok(()) => {
                    tracing::debug!(%url, "Endpoint reachable");
                    return true;
                }
                Err(e) => tracing::debug!(%url, "Endpoint check failed: {e}"),
            }
        }
        false
    }
}
