// src/ingest/rate_limit.rs
//! Per-domain minimum-interval gate for outbound fetches.
//!
//! Each domain owns its own async lock, so callers for different domains never
//! wait on each other; callers for the same domain are served first come, first served.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 30;

type Slot = Arc<tokio::sync::Mutex<Option<Instant>>>;

#[derive(Debug)]
pub struct RateLimiter {
    delay: Duration,
    domains: Mutex<HashMap<String, Slot>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_REQUESTS_PER_MINUTE)
    }
}

impl RateLimiter {
    pub fn new(requests_per_minute: u32) -> Self {
        let rpm = requests_per_minute.max(1);
        Self {
            delay: Duration::from_secs_f64(60.0 / f64::from(rpm)),
            domains: Mutex::new(HashMap::new()),
        }
    }

    /// Minimum spacing between two permitted calls for one domain.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    fn slot(&self, domain: &str) -> Slot {
        let mut map = self.domains.lock();
        map.entry(domain.to_string()).or_default().clone()
    }

    /// Suspend until `delay` has passed since the last permitted call for `domain`,
    /// then record this call.
    pub async fn wait(&self, domain: &str) {
        let slot = self.slot(domain);
        let mut last = slot.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.delay {
                let pause = self.delay - elapsed;
                debug!(
                    target: "ingest",
                    domain,
                    wait_ms = pause.as_millis() as u64,
                    "rate limit wait"
                );
                tokio::time::sleep(pause).await;
            }
        }
        *last = Some(Instant::now());
    }
}
