// src/ingest/robots.rs
//! robots.txt compliance for the generic user agent `*`.
//!
//! Any failure to obtain robots.txt fails open: a single unreachable origin
//! must not disable its feed.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};
use url::Url;

use crate::ingest::origin_of;
use crate::ingest::transport::FeedTransport;

pub const DEFAULT_ROBOTS_TTL: Duration = Duration::from_secs(60 * 60);

/// Allow/Disallow patterns that apply to `*`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RobotsRules {
    allow: Vec<String>,
    disallow: Vec<String>,
}

impl RobotsRules {
    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn disallow_all() -> Self {
        Self {
            allow: Vec::new(),
            disallow: vec!["/".to_string()],
        }
    }

    /// Parse robots.txt, keeping rules from every group that names `*`.
    pub fn parse(content: &str) -> Self {
        let mut rules = Self::default();
        let mut group_applies = false;
        let mut in_agent_lines = false;

        for line in content.lines() {
            let line = line.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }
            let Some((directive, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match directive.trim().to_ascii_lowercase().as_str() {
                "user-agent" => {
                    // consecutive user-agent lines share one group
                    if !in_agent_lines {
                        group_applies = false;
                    }
                    in_agent_lines = true;
                    if value == "*" {
                        group_applies = true;
                    }
                }
                "allow" => {
                    in_agent_lines = false;
                    if group_applies && !value.is_empty() {
                        rules.allow.push(value.to_string());
                    }
                }
                "disallow" => {
                    in_agent_lines = false;
                    if group_applies && !value.is_empty() {
                        rules.disallow.push(value.to_string());
                    }
                }
                _ => in_agent_lines = false,
            }
        }
        rules
    }

    /// Longest matching pattern wins; on a tie Allow wins.
    pub fn is_allowed(&self, path: &str) -> bool {
        if path == "/robots.txt" {
            return true;
        }
        let longest = |patterns: &[String]| {
            patterns
                .iter()
                .filter(|p| pattern_matches(path, p))
                .map(|p| p.len())
                .max()
        };
        match (longest(&self.allow), longest(&self.disallow)) {
            (_, None) => true,
            (None, Some(_)) => false,
            (Some(a), Some(d)) => a >= d,
        }
    }
}

/// robots.txt path pattern match with `*` wildcards and a trailing `$` anchor.
fn pattern_matches(path: &str, pattern: &str) -> bool {
    let (pattern, anchored) = match pattern.strip_suffix('$') {
        Some(p) => (p, true),
        None => (pattern, false),
    };
    let mut parts = pattern.split('*');
    let first = parts.next().unwrap_or_default();
    if !path.starts_with(first) {
        return false;
    }
    let rest: Vec<&str> = parts.collect();
    let mut pos = first.len();
    if rest.is_empty() {
        return !anchored || pos == path.len();
    }
    for (i, part) in rest.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if anchored && i == rest.len() - 1 {
            return path.len() >= pos + part.len() && path.ends_with(part);
        }
        match path[pos..].find(part) {
            Some(off) => pos += off + part.len(),
            None => return false,
        }
    }
    !anchored || pattern.ends_with('*') || pos == path.len()
}

#[derive(Debug, Clone)]
struct CachedRobots {
    rules: RobotsRules,
    fetched_at: Instant,
}

/// Fetches and caches robots.txt per origin.
pub struct RobotsChecker {
    transport: Arc<dyn FeedTransport>,
    ttl: Duration,
    cache: Mutex<HashMap<String, CachedRobots>>,
}

impl RobotsChecker {
    pub fn new(transport: Arc<dyn FeedTransport>, ttl: Duration) -> Self {
        Self {
            transport,
            ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn cached(&self, origin: &str) -> Option<RobotsRules> {
        let cache = self.cache.lock();
        cache
            .get(origin)
            .filter(|c| c.fetched_at.elapsed() < self.ttl)
            .map(|c| c.rules.clone())
    }

    /// May `*` fetch `url`? Fails open on every error.
    pub async fn allowed(&self, url: &str) -> bool {
        let parsed = match Url::parse(url) {
            Ok(u) => u,
            Err(e) => {
                warn!(target: "ingest", url, error = %e, "cannot check robots.txt for unparsable url");
                return true;
            }
        };
        let Some(origin) = origin_of(&parsed) else {
            warn!(target: "ingest", url, "url has no host; skipping robots.txt check");
            return true;
        };
        let path = match parsed.query() {
            Some(q) => format!("{}?{}", parsed.path(), q),
            None => parsed.path().to_string(),
        };

        if let Some(rules) = self.cached(&origin) {
            return rules.is_allowed(&path);
        }

        let robots_url = format!("{origin}/robots.txt");
        let rules = match self.transport.get(&robots_url).await {
            Ok(resp) if resp.is_success() => {
                RobotsRules::parse(&String::from_utf8_lossy(&resp.body))
            }
            Ok(resp) if resp.status == 401 || resp.status == 403 => RobotsRules::disallow_all(),
            Ok(resp) => {
                debug!(target: "ingest", %robots_url, status = resp.status, "no robots.txt; allowing all");
                RobotsRules::allow_all()
            }
            Err(e) => {
                warn!(target: "ingest", %robots_url, error = %e, "could not check robots.txt; failing open");
                counter!("ingest_robots_unavailable_total").increment(1);
                return true;
            }
        };

        let allowed = rules.is_allowed(&path);
        self.cache.lock().insert(
            origin,
            CachedRobots {
                rules,
                fetched_at: Instant::now(),
            },
        );
        allowed
    }
}
