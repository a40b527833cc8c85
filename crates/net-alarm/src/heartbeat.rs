//! Heartbeat Notifier
//!
//! On a healthy cycle the watchdog pings an external push monitor (e.g. an
//! Uptime Kuma push URL). When the pings stop arriving the monitor raises
//! its own alarm, which is how a dead watchdog gets noticed. Failures here
//! are logged and dropped.

use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait Heartbeat: Send + Sync {
    /// Best-effort push; never fails
    async fn notify(&self);
}

/// GET-based push notifier; a no-op without a URL
#[derive(Debug, Clone)]
pub struct HttpHeartbeat {
    client: reqwest::Client,
    url: Option<String>,
}

impl HttpHeartbeat {
    pub fn new(url: Option<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}

#[async_trait]
impl Heartbeat for HttpHeartbeat {
    async fn notify(&self) {
        let Some(url) = &self.url else {
            return;
        };
        match self.client.get(url).send().await {
            Ok(resp) => tracing::debug!(status = %resp.status(), "Connectivity OK, heartbeat pushed"),
            Err(e) => tracing::debug!("Cannot push heartbeat: {e}"),
        }
    }
}

/// Heartbeat that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHeartbeat;

#[async_trait]
impl Heartbeat for NoHeartbeat {
    async fn notify(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_absent_url_is_noop() {
        let hb = HttpHeartbeat::new(None, Duration::from_secs(1)).unwrap();
        assert!(hb.url().is_none());
        hb.notify().await;
    }

    #[tokio::test]
    async fn test_unreachable_url_is_swallowed() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let hb = HttpHeartbeat::new(Some(format!("http://{addr}/push")), Duration::from_secs(1))
            .unwrap();
        hb.notify().await;
    }
}
