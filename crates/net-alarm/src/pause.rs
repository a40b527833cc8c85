//! Injectable delay primitive
//!
//! The reset pulse holds the cycle for its full duration. Production code
//! sleeps on the tokio timer; tests swap in [`NoPause`] to record the
//! requested holds without waiting.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[async_trait]
pub trait Pause: Send + Sync {
    async fn pause(&self, duration: Duration);
}

/// Real wall-clock wait
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPause;

#[async_trait]
impl Pause for TokioPause {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Returns immediately and remembers what it was asked to wait for
#[derive(Debug, Clone, Default)]
pub struct NoPause {
    requested: Arc<Mutex<Vec<Duration>>>,
}

impl NoPause {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every duration requested so far
    pub fn requested(&self) -> Vec<Duration> {
        self.requested
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Pause for NoPause {
    async fn pause(&self, duration: Duration) {
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(duration);
        }
    }
}
