// src/config/settings.rs
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::config::ai::BriefingConfig;
use crate::ingest::rate_limit::DEFAULT_REQUESTS_PER_MINUTE;
use crate::ingest::robots::DEFAULT_ROBOTS_TTL;
use crate::ingest::scheduler::{DEFAULT_CONCURRENCY, DEFAULT_INTERVAL};

pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_BIND_ADDR: &str = "BIND_ADDR";
pub const ENV_INGEST_INTERVAL_SECS: &str = "INGEST_INTERVAL_SECS";
pub const ENV_INGEST_CONCURRENCY: &str = "INGEST_CONCURRENCY";
pub const ENV_RATE_LIMIT_RPM: &str = "RATE_LIMIT_RPM";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "HTTP_TIMEOUT_SECS";
pub const ENV_ROBOTS_CACHE_TTL_SECS: &str = "ROBOTS_CACHE_TTL_SECS";
pub const ENV_SOURCES_CONFIG_PATH: &str = "SOURCES_CONFIG_PATH";
pub const ENV_EVENTS_CONFIG_PATH: &str = "EVENTS_CONFIG_PATH";

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_SOURCES_CONFIG_PATH: &str = "config/sources.toml";
pub const DEFAULT_EVENTS_CONFIG_PATH: &str = "config/events.toml";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{var} has invalid value `{value}`")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub ingest_interval: Duration,
    pub ingest_concurrency: usize,
    pub rate_limit_rpm: u32,
    pub http_timeout: Duration,
    pub robots_cache_ttl: Duration,
    pub sources_path: PathBuf,
    pub events_path: PathBuf,
    pub briefing: BriefingConfig,
}

/// Unset or blank falls back to `default`; anything else must parse.
fn parsed<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => {
            let trimmed = v.trim().to_string();
            trimmed
                .parse()
                .map_err(|_| ConfigError::Invalid { var, value: v })
        }
        _ => Ok(default),
    }
}

fn path_or(var: &str, default: &str) -> PathBuf {
    env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}

impl Settings {
    /// Read settings from the process environment. `DATABASE_URL` is required.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var(ENV_DATABASE_URL)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing(ENV_DATABASE_URL))?;

        let default_bind = SocketAddr::from(([0, 0, 0, 0], 8000));
        let interval_secs: u64 = parsed(ENV_INGEST_INTERVAL_SECS, DEFAULT_INTERVAL.as_secs())?;
        let concurrency: usize = parsed(ENV_INGEST_CONCURRENCY, DEFAULT_CONCURRENCY)?;
        if interval_secs == 0 {
            return Err(ConfigError::Invalid {
                var: ENV_INGEST_INTERVAL_SECS,
                value: "0".into(),
            });
        }
        if concurrency == 0 {
            return Err(ConfigError::Invalid {
                var: ENV_INGEST_CONCURRENCY,
                value: "0".into(),
            });
        }

        Ok(Self {
            database_url,
            bind_addr: parsed(ENV_BIND_ADDR, default_bind)?,
            ingest_interval: Duration::from_secs(interval_secs),
            ingest_concurrency: concurrency,
            rate_limit_rpm: parsed(ENV_RATE_LIMIT_RPM, DEFAULT_REQUESTS_PER_MINUTE)?,
            http_timeout: Duration::from_secs(parsed(ENV_HTTP_TIMEOUT_SECS, 20)?),
            robots_cache_ttl: Duration::from_secs(parsed(
                ENV_ROBOTS_CACHE_TTL_SECS,
                DEFAULT_ROBOTS_TTL.as_secs(),
            )?),
            sources_path: path_or(ENV_SOURCES_CONFIG_PATH, DEFAULT_SOURCES_CONFIG_PATH),
            events_path: path_or(ENV_EVENTS_CONFIG_PATH, DEFAULT_EVENTS_CONFIG_PATH),
            briefing: BriefingConfig::from_env(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ALL: [&str; 9] = [
        ENV_DATABASE_URL,
        ENV_BIND_ADDR,
        ENV_INGEST_INTERVAL_SECS,
        ENV_INGEST_CONCURRENCY,
        ENV_RATE_LIMIT_RPM,
        ENV_HTTP_TIMEOUT_SECS,
        ENV_ROBOTS_CACHE_TTL_SECS,
        ENV_SOURCES_CONFIG_PATH,
        ENV_EVENTS_CONFIG_PATH,
    ];

    fn clear() {
        for v in ALL {
            env::remove_var(v);
        }
    }

    #[test]
    #[serial]
    fn database_url_is_required() {
        clear();
        assert_eq!(
            Settings::from_env().unwrap_err(),
            ConfigError::Missing(ENV_DATABASE_URL)
        );
    }

    #[test]
    #[serial]
    fn defaults_apply() {
        clear();
        env::set_var(ENV_DATABASE_URL, "data/feed.db");
        let s = Settings::from_env().unwrap();
        assert_eq!(s.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(s.ingest_interval, Duration::from_secs(1800));
        assert_eq!(s.ingest_concurrency, 5);
        assert_eq!(s.rate_limit_rpm, 30);
        assert_eq!(s.http_timeout, Duration::from_secs(20));
        assert_eq!(s.sources_path, PathBuf::from(DEFAULT_SOURCES_CONFIG_PATH));
        clear();
    }

    #[test]
    #[serial]
    fn bad_number_is_reported() {
        clear();
        env::set_var(ENV_DATABASE_URL, "data/feed.db");
        env::set_var(ENV_RATE_LIMIT_RPM, "fast");
        assert!(matches!(
            Settings::from_env(),
            Err(ConfigError::Invalid { var: ENV_RATE_LIMIT_RPM, .. })
        ));
        clear();
    }
}
