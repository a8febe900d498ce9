// src/config/sources.rs
//! Feed list and event catalog. Both are TOML files that fall back to
//! built-in defaults when the file does not exist.
//!
//! ```toml
//! [[source]]
//! name = "SpaceNews"
//! url = "https://spacenews.com/feed/"
//! category = "Space Industry"
//! group = "Space Industry"
//!
//! [[event]]
//! title = "Space Systems Command Briefing"
//! category = "Briefing"
//! location = "Colorado Springs, CO"
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::ingest::catalog::{default_events, CatalogEvent};
use crate::ingest::types::Source;

#[derive(Deserialize)]
struct SourcesFile {
    #[serde(default, rename = "source")]
    sources: Vec<Source>,
}

#[derive(Deserialize)]
struct EventsFile {
    #[serde(default, rename = "event")]
    events: Vec<CatalogEvent>,
}

/// The eight feeds the aggregator ships with, grouped by provider type.
pub fn default_sources() -> Vec<Source> {
    vec![
        Source::new(
            "Defense News",
            "https://www.defensenews.com/arc/outboundfeeds/rss/category/space/?outputType=xml",
            "Military Space",
        )
        .in_group("Military"),
        Source::new(
            "Military.com",
            "https://www.military.com/rss-feeds/space-force-news.xml",
            "Military Space",
        )
        .in_group("Military"),
        Source::new("SpaceNews", "https://spacenews.com/feed/", "Space Industry")
            .in_group("Space Industry"),
        Source::new("Space.com", "https://www.space.com/feeds/all", "Space Science")
            .in_group("Space Industry"),
        Source::new(
            "Space Force",
            "https://www.spaceforce.mil/DesktopModules/ArticleCS/RSS.aspx?ContentType=1&Site=1060",
            "Official Updates",
        )
        .in_group("Government"),
        Source::new(
            "Defense.gov",
            "https://www.defense.gov/News/RSS/GeographicRegions/",
            "Defense Updates",
        )
        .in_group("Government"),
        Source::new(
            "NASA",
            "https://www.nasa.gov/rss/dyn/breaking_news.rss",
            "Space Science",
        )
        .in_group("Science/Tech"),
        Source::new(
            "Space Tech",
            "https://techcrunch.com/tag/space/feed/",
            "Space Technology",
        )
        .in_group("Science/Tech"),
    ]
}

fn validate_sources(sources: Vec<Source>) -> Result<Vec<Source>> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(sources.len());
    for mut s in sources {
        s.name = s.name.trim().to_string();
        s.url = s.url.trim().to_string();
        s.category = s.category.trim().to_string();
        if s.name.is_empty() || s.category.is_empty() {
            bail!("source entries need a name and a category");
        }
        url::Url::parse(&s.url).with_context(|| format!("source `{}` has a bad url", s.name))?;
        if !seen.insert(s.name.clone()) {
            bail!("duplicate source name `{}`", s.name);
        }
        out.push(s);
    }
    Ok(out)
}

pub fn parse_sources(content: &str) -> Result<Vec<Source>> {
    let file: SourcesFile = toml::from_str(content).context("parsing sources TOML")?;
    validate_sources(file.sources)
}

pub fn parse_events(content: &str) -> Result<Vec<CatalogEvent>> {
    let file: EventsFile = toml::from_str(content).context("parsing events TOML")?;
    if let Some(bad) = file
        .events
        .iter()
        .find(|e| e.title.trim().is_empty() || e.category.trim().is_empty())
    {
        bail!("event entries need a title and a category (got {bad:?})");
    }
    Ok(file.events)
}

/// Missing file => built-in defaults; unreadable or malformed => error.
pub fn load_sources(path: &Path) -> Result<Vec<Source>> {
    if !path.exists() {
        info!(path = %path.display(), "sources file not found; using built-in feeds");
        return Ok(default_sources());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading sources from {}", path.display()))?;
    parse_sources(&content).with_context(|| format!("in {}", path.display()))
}

pub fn load_events(path: &Path) -> Result<Vec<CatalogEvent>> {
    if !path.exists() {
        info!(path = %path.display(), "events file not found; using built-in catalog");
        return Ok(default_events());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading events from {}", path.display()))?;
    parse_events(&content).with_context(|| format!("in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid_and_unique() {
        let sources = validate_sources(default_sources()).unwrap();
        assert_eq!(sources.len(), 8);
        assert!(sources.iter().all(|s| s.group.is_some()));
    }

    #[test]
    fn toml_tables_parse() {
        let toml = r#"
[[source]]
name = " NASA "
url = "https://www.nasa.gov/rss/dyn/breaking_news.rss"
category = "Space Science"
"#;
        let sources = parse_sources(toml).unwrap();
        assert_eq!(sources[0].name, "NASA");
        assert_eq!(sources[0].group, None);

        let events = parse_events(
            r#"
[[event]]
title = "Launch window review"
category = "Briefing"
date = "2024-06-01T15:00:00Z"
"#,
        )
        .unwrap();
        assert_eq!(events.len(), 1);
        assert!(events[0].date.is_some());
        assert_eq!(events[0].location, "");
    }

    #[test]
    fn duplicates_and_bad_urls_fail() {
        let dup = r#"
[[source]]
name = "A"
url = "https://a.test/feed"
category = "X"
[[source]]
name = "A"
url = "https://b.test/feed"
category = "X"
"#;
        assert!(parse_sources(dup).is_err());
        let bad = "[[source]]\nname = \"A\"\nurl = \"not a url\"\ncategory = \"X\"\n";
        assert!(parse_sources(bad).is_err());
    }

    #[test]
    fn missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("absent.toml");
        assert_eq!(load_sources(&p).unwrap().len(), 8);
        assert_eq!(load_events(&p).unwrap().len(), 2);

        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "[[source]\n").unwrap();
        assert!(load_sources(&broken).is_err());
    }
}
