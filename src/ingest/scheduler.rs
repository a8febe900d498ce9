// src/ingest/scheduler.rs
//! Bounded fan-out over all sources, plus the periodic background runner.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use metrics::{counter, gauge};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::ingest::catalog::CatalogEvent;
use crate::ingest::fetcher::FeedFetcher;
use crate::ingest::types::{CanonicalRecord, Source};
use crate::store::{RecordFilter, StoreError};

pub const DEFAULT_CONCURRENCY: usize = 5;
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Counts from one full cycle (feeds + catalog), after read-back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleSummary {
    pub fetched: usize,
    pub news: usize,
    pub events: usize,
}

pub struct IngestionScheduler {
    fetcher: FeedFetcher,
    concurrency: usize,
    cancel: CancellationToken,
}

impl IngestionScheduler {
    pub fn new(fetcher: FeedFetcher, concurrency: usize) -> Self {
        Self {
            fetcher,
            concurrency: concurrency.max(1),
            cancel: CancellationToken::new(),
        }
    }

    /// Pending fetches of a running cycle stop when `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Fetch every source with at most `concurrency` in flight.
    /// Records come back in completion order across sources and document
    /// order within a source.
    pub async fn fan_out(&self, sources: &[Source]) -> Vec<CanonicalRecord> {
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut set = JoinSet::new();

        for source in sources.iter().cloned() {
            let fetcher = self.fetcher.clone();
            let permits = permits.clone();
            let cancel = self.cancel.clone();
            set.spawn(async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return (source.name, Vec::new());
                };
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => (source.name, Vec::new()),
                    records = fetcher.fetch(&source) => (source.name, records),
                }
            });
        }

        let mut out = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((name, mut records)) => {
                    info!(target: "ingest", source = %name, items = records.len(), "source done");
                    out.append(&mut records);
                }
                Err(e) => {
                    error!(target: "ingest", error = %e, "fetch task failed");
                    counter!("ingest_source_errors_total").increment(1);
                }
            }
        }
        out
    }

    /// One ingestion pass over `sources`; returns the full news read-back.
    pub async fn run_cycle(&self, sources: &[Source]) -> Result<Vec<CanonicalRecord>, StoreError> {
        let fetched = self.fan_out(sources).await;
        info!(target: "ingest", fetched = fetched.len(), sources = sources.len(), "feeds fetched");
        self.fetcher
            .store()
            .run(|s| s.get_news(&RecordFilter::default()))
            .await
    }

    /// Store the internal catalog; returns the full events read-back.
    pub async fn refresh_events(
        &self,
        catalog: &[CatalogEvent],
    ) -> Result<Vec<CanonicalRecord>, StoreError> {
        let store = self.fetcher.store();
        let now = Utc::now();
        for event in catalog {
            let record = event.to_record(now);
            let title = record.title.clone();
            if let Err(e) = store.run(move |s| s.upsert_event(&record)).await {
                warn!(target: "ingest", error = %e, %title, "failed to store event");
                counter!("store_write_errors_total").increment(1);
            }
        }
        store.run(|s| s.get_events(&RecordFilter::default())).await
    }

    /// Feeds then catalog, the unit of work of the periodic runner.
    pub async fn run_full_cycle(
        &self,
        sources: &[Source],
        catalog: &[CatalogEvent],
    ) -> Result<CycleSummary, StoreError> {
        crate::ingest::ensure_metrics_described();
        let fetched = self.fan_out(sources).await.len();
        let news = self
            .fetcher
            .store()
            .run(|s| s.get_news(&RecordFilter::default()))
            .await?
            .len();
        let events = self.refresh_events(catalog).await?.len();

        counter!("ingest_cycles_total").increment(1);
        gauge!("ingest_cycle_last_run_ts").set(Utc::now().timestamp() as f64);
        Ok(CycleSummary {
            fetched,
            news,
            events,
        })
    }
}

/// Owns the background ingestion loop.
pub struct PeriodicRunner {
    scheduler: Arc<IngestionScheduler>,
    sources: Arc<Vec<Source>>,
    catalog: Arc<Vec<CatalogEvent>>,
    interval: Duration,
}

impl PeriodicRunner {
    pub fn new(
        scheduler: Arc<IngestionScheduler>,
        sources: Arc<Vec<Source>>,
        catalog: Arc<Vec<CatalogEvent>>,
        interval: Duration,
    ) -> Self {
        Self {
            scheduler,
            sources,
            catalog,
            interval,
        }
    }

    /// Run a cycle now, then every `interval`, until `cancel` fires.
    /// A failing cycle is logged and the loop keeps going.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let cycle = self.scheduler.run_full_cycle(&self.sources, &self.catalog);
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    res = cycle => match res {
                        Ok(summary) => info!(
                            target: "ingest",
                            fetched = summary.fetched,
                            news = summary.news,
                            events = summary.events,
                            "ingestion cycle complete"
                        ),
                        Err(e) => error!(target: "ingest", error = %e, "ingestion cycle failed"),
                    }
                }
            }
            info!(target: "ingest", "periodic runner stopped");
        })
    }
}
