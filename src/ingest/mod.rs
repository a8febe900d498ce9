// src/ingest/mod.rs
//! Feed ingestion: fetch -> parse -> normalize -> persist.

pub mod catalog;
pub mod error;
pub mod fallback_image;
pub mod feed;
pub mod fetcher;
pub mod normalize;
pub mod rate_limit;
pub mod robots;
pub mod scheduler;
pub mod transport;
pub mod types;

pub use catalog::CatalogEvent;
pub use error::{FetchError, NormalizeError};
pub use fetcher::FeedFetcher;
pub use rate_limit::RateLimiter;
pub use robots::RobotsChecker;
pub use scheduler::{IngestionScheduler, PeriodicRunner};
pub use transport::{FeedTransport, Fetched, HttpTransport};
pub use types::{CanonicalRecord, MediaRef, RawEntry, Source};

use metrics::{describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;
use url::Url;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_entries_total", "Entries normalized and stored.");
        describe_counter!(
            "ingest_entry_errors_total",
            "Entries skipped (normalize or store failure)."
        );
        describe_counter!(
            "ingest_source_errors_total",
            "Whole-feed fetch/parse failures."
        );
        describe_counter!(
            "ingest_robots_denied_total",
            "Feeds skipped because robots.txt disallows them."
        );
        describe_counter!(
            "ingest_robots_unavailable_total",
            "robots.txt lookups that failed open."
        );
        describe_counter!("ingest_cycles_total", "Completed ingestion cycles.");
        describe_counter!(
            "store_write_errors_total",
            "Records whose write transaction failed."
        );
        describe_histogram!("ingest_fetch_ms", "Feed fetch+parse time in milliseconds.");
        describe_gauge!(
            "ingest_cycle_last_run_ts",
            "Unix ts when an ingestion cycle last finished."
        );
    });
}

/// `scheme://host[:port]`, the key for robots caching and rate limiting.
pub fn origin_of(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}
