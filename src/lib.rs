// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod analytics;
pub mod api;
pub mod briefing;
pub mod config;
pub mod ingest;
pub mod metrics;
pub mod store;

pub use crate::api::{router, AppState};
pub use crate::ingest::{CanonicalRecord, IngestionScheduler, PeriodicRunner, Source};
pub use crate::store::{RecordFilter, Store, StoreError};

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Settings;
use crate::ingest::{FeedFetcher, FeedTransport, HttpTransport, RateLimiter, RobotsChecker};

const DEFAULT_LOG_FILTER: &str = "space_defense_feed=info,warn";

/// Install the global subscriber. `LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
    if let Err(e) = res {
        eprintln!("tracing already initialized: {e}");
    }
}

/// Build the ingestion pipeline for `settings` over an injected transport.
pub fn build_scheduler(
    settings: &Settings,
    store: Store,
    transport: Arc<dyn FeedTransport>,
) -> IngestionScheduler {
    let limiter = Arc::new(RateLimiter::new(settings.rate_limit_rpm));
    let robots = Arc::new(RobotsChecker::new(
        transport.clone(),
        settings.robots_cache_ttl,
    ));
    let fetcher = FeedFetcher::new(transport, limiter, robots, store);
    IngestionScheduler::new(fetcher, settings.ingest_concurrency)
}

/// Production transport honoring `HTTP_TIMEOUT_SECS`.
pub fn http_transport(settings: &Settings) -> anyhow::Result<Arc<dyn FeedTransport>> {
    let t = HttpTransport::new(settings.http_timeout).context("building http client")?;
    Ok(Arc::new(t))
}
