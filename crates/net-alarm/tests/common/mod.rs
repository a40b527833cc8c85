//! Shared fixtures: canned HTTP endpoints, scripted probers, output groups

#![allow(dead_code)]

use async_trait::async_trait;
use net_alarm::probe::Prober;
use net_alarm::{Output, OutputGroups};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub const TROUBLE: u32 = 17;
pub const ZONE: u32 = 22;
pub const EXTENDED: u32 = 27;
pub const RESET: u32 = 23;
pub const ALL_PINS: [u32; 4] = [TROUBLE, ZONE, EXTENDED, RESET];

pub fn groups() -> OutputGroups {
    OutputGroups {
        trouble: vec![
            Output::new("Green/Yellow LED", TROUBLE),
            Output::new("Trouble Supervisory Zone", ZONE),
        ],
        extended_trouble: vec![Output::new("Red LED", EXTENDED)],
        reset: vec![Output::new("Reset Output", RESET)],
    }
}

/// A local endpoint answering every request with `status`
pub struct Endpoint {
    pub url: String,
    hits: Arc<AtomicUsize>,
}

impl Endpoint {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Serve `status` with an empty body on a random local port
pub async fn serve(status: u16) -> Endpoint {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    tokio::spawn(async move {
        while let Ok((mut sock, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                loop {
                    let n = sock.read(&mut buf).await.unwrap_or(0);
                    if n == 0 {
                        break;
                    }
                    request.extend_from_slice(&buf[..n]);
                    if request.windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
                let reason = if status == 200 { "OK" } else { "Error" };
                let response = format!(
                    "HTTP/1.1 {status} {reason}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
                );
                let _ = sock.write_all(response.as_bytes()).await;
                let _ = sock.shutdown().await;
            });
        }
    });

    Endpoint {
        url: format!("http://{addr}/"),
        hits,
    }
}

/// Accept connections and never answer
pub async fn serve_silence() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((sock, _)) = listener.accept().await {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(30)).await;
                drop(sock);
            });
        }
    });
    format!("http://{addr}/")
}

/// A URL on which nothing is listening
pub fn dead_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/")
}

/// Replays a fixed verdict sequence, repeating the last one when exhausted
pub struct ScriptedProber {
    verdicts: Mutex<VecDeque<bool>>,
    last: Mutex<bool>,
}

impl ScriptedProber {
    pub fn new(verdicts: impl IntoIterator<Item = bool>) -> Self {
        Self {
            verdicts: Mutex::new(verdicts.into_iter().collect()),
            last: Mutex::new(false),
        }
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self) -> bool {
        let next = self.verdicts.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        if let Some(v) = next {
            *last = v;
        }
        *last
    }
}
