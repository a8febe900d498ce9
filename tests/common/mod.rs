// tests/common/mod.rs
//
// Shared fixtures: an in-memory transport and store helpers.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use space_defense_feed::ingest::{
    FeedFetcher, FeedTransport, FetchError, Fetched, RateLimiter, RobotsChecker,
};
use space_defense_feed::Store;

pub fn fixture(name: &str) -> Vec<u8> {
    let path = format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));
    std::fs::read(&path).unwrap_or_else(|e| panic!("reading {path}: {e}"))
}

enum Route {
    Body { status: u16, body: Vec<u8> },
    Fail(String),
}

/// Serves registered URLs; anything else is a 404. Records every request.
#[derive(Default)]
pub struct FixtureTransport {
    routes: Mutex<HashMap<String, Route>>,
    hits: Mutex<Vec<String>>,
}

impl FixtureTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(self, url: &str, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.routes.lock().insert(
            url.to_string(),
            Route::Body {
                status,
                body: body.into(),
            },
        );
        self
    }

    pub fn fail(self, url: &str, reason: &str) -> Self {
        self.routes
            .lock()
            .insert(url.to_string(), Route::Fail(reason.to_string()));
        self
    }

    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().clone()
    }

    pub fn hit_count(&self, url: &str) -> usize {
        self.hits.lock().iter().filter(|h| h.as_str() == url).count()
    }
}

#[async_trait]
impl FeedTransport for FixtureTransport {
    async fn get(&self, url: &str) -> Result<Fetched, FetchError> {
        self.hits.lock().push(url.to_string());
        match self.routes.lock().get(url) {
            Some(Route::Body { status, body }) => Ok(Fetched {
                status: *status,
                body: body.clone(),
            }),
            Some(Route::Fail(reason)) => Err(FetchError::Transport(reason.clone())),
            None => Ok(Fetched {
                status: 404,
                body: Vec::new(),
            }),
        }
    }
}

pub fn temp_store() -> (tempfile::TempDir, Store) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("feed.db");
    let store = Store::open(path.to_str().expect("utf8 path")).expect("open store");
    (dir, store)
}

/// Fetcher over `transport` with a limiter fast enough not to slow tests down.
pub fn fetcher(transport: Arc<FixtureTransport>, store: Store) -> FeedFetcher {
    let transport: Arc<dyn FeedTransport> = transport;
    let robots = Arc::new(RobotsChecker::new(
        transport.clone(),
        std::time::Duration::from_secs(3600),
    ));
    FeedFetcher::new(transport, Arc::new(RateLimiter::new(60_000)), robots, store)
}
