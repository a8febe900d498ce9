// src/ingest/transport.rs
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::ingest::error::FetchError;

pub const USER_AGENT: &str = concat!(
    "space-defense-feed/",
    env!("CARGO_PKG_VERSION"),
    " (+feed aggregator; respects robots.txt)"
);

/// Raw HTTP answer: status plus body bytes.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Fetched {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Low-level GET used for both feed documents and robots.txt.
/// Separated so the pipeline can run against fixtures in tests.
#[async_trait]
pub trait FeedTransport: Send + Sync {
    async fn get(&self, url: &str) -> Result<Fetched, FetchError>;
}

/// reqwest-backed transport with explicit per-request timeouts.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FeedTransport for HttpTransport {
    async fn get(&self, url: &str) -> Result<Fetched, FetchError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let status = resp.status().as_u16();
        let body = resp
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Fetched {
            status,
            body: body.to_vec(),
        })
    }
}
