// src/ingest/fetcher.rs
//! One source end-to-end: robots check, rate limit, GET, parse, normalize, store.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use metrics::{counter, histogram};
use tracing::{debug, info, warn};
use url::Url;

use crate::ingest::error::FetchError;
use crate::ingest::feed::parse_feed;
use crate::ingest::normalize::normalize_entry;
use crate::ingest::origin_of;
use crate::ingest::rate_limit::RateLimiter;
use crate::ingest::robots::RobotsChecker;
use crate::ingest::transport::FeedTransport;
use crate::ingest::types::{CanonicalRecord, RawEntry, Source};
use crate::store::Store;

/// Shared by every worker of a cycle; all collaborators are injected.
#[derive(Clone)]
pub struct FeedFetcher {
    transport: Arc<dyn FeedTransport>,
    limiter: Arc<RateLimiter>,
    robots: Arc<RobotsChecker>,
    store: Store,
}

impl FeedFetcher {
    pub fn new(
        transport: Arc<dyn FeedTransport>,
        limiter: Arc<RateLimiter>,
        robots: Arc<RobotsChecker>,
        store: Store,
    ) -> Self {
        Self {
            transport,
            limiter,
            robots,
            store,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Fetch, normalize and persist one source. Never fails: whole-feed
    /// errors are logged and yield an empty list, entry errors skip the entry.
    pub async fn fetch(&self, source: &Source) -> Vec<CanonicalRecord> {
        crate::ingest::ensure_metrics_described();
        match self.try_fetch(source).await {
            Ok(records) => records,
            Err(e) => {
                warn!(target: "ingest", error = %e, source = %source.name, "feed fetch failed");
                counter!("ingest_source_errors_total", "source" => source.name.clone())
                    .increment(1);
                Vec::new()
            }
        }
    }

    async fn try_fetch(&self, source: &Source) -> Result<Vec<CanonicalRecord>, FetchError> {
        let url = Url::parse(&source.url).map_err(|_| FetchError::InvalidUrl(source.url.clone()))?;
        let origin = origin_of(&url).ok_or_else(|| FetchError::InvalidUrl(source.url.clone()))?;

        if !self.robots.allowed(&source.url).await {
            info!(target: "ingest", source = %source.name, url = %source.url, "robots.txt disallows feed; skipping");
            counter!("ingest_robots_denied_total").increment(1);
            return Ok(Vec::new());
        }

        self.limiter.wait(&origin).await;

        let started = Instant::now();
        let entries = self.retrieve(&source.url).await?;
        histogram!("ingest_fetch_ms").record(started.elapsed().as_secs_f64() * 1000.0);
        debug!(target: "ingest", source = %source.name, entries = entries.len(), "feed parsed");

        let mut stored = Vec::with_capacity(entries.len());
        let now = Utc::now();
        for entry in &entries {
            let record = match normalize_entry(entry, source, now) {
                Ok(r) => r,
                Err(e) => {
                    warn!(target: "ingest", error = %e, source = %source.name, "skipping entry");
                    counter!("ingest_entry_errors_total").increment(1);
                    continue;
                }
            };

            let to_write = record.clone();
            match self.store.run(move |s| s.upsert_news(&to_write)).await {
                Ok(_) => {
                    counter!("ingest_entries_total").increment(1);
                    stored.push(record);
                }
                Err(e) => {
                    warn!(target: "ingest", error = %e, source = %source.name, title = %record.title, "failed to store entry");
                    counter!("ingest_entry_errors_total").increment(1);
                    counter!("store_write_errors_total").increment(1);
                }
            }
        }

        info!(target: "ingest", source = %source.name, stored = stored.len(), "feed ingested");
        Ok(stored)
    }

    async fn retrieve(&self, url: &str) -> Result<Vec<RawEntry>, FetchError> {
        let resp = self.transport.get(url).await?;
        if !resp.is_success() {
            return Err(FetchError::Status {
                status: resp.status,
                url: url.to_string(),
            });
        }
        parse_feed(&resp.body)
    }
}
