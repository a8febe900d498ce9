// src/ingest/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One configured feed. `group` is only used for display grouping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Source {
    pub name: String,
    pub url: String,
    pub category: String,
    #[serde(default)]
    pub group: Option<String>,
}

impl Source {
    pub fn new(name: &str, url: &str, category: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            category: category.to_string(),
            group: None,
        }
    }

    pub fn in_group(mut self, group: &str) -> Self {
        self.group = Some(group.to_string());
        self
    }
}

/// Media reference attached to a feed entry, in the order the document lists them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaRef {
    /// `media:content`; `medium`/`mime` are whatever the feed declared.
    Content {
        url: String,
        medium: Option<String>,
        mime: Option<String>,
    },
    /// `media:thumbnail`
    Thumbnail { url: String },
    /// Atom `<link>` or RSS `<enclosure>` with a declared MIME type.
    Link { href: String, mime: Option<String> },
}

/// A feed item exactly as the document delivered it. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub published: Option<String>,
    pub updated: Option<String>,
    pub link: Option<String>,
    pub media: Vec<MediaRef>,
}

/// Normalized, storage-ready news item or event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CanonicalRecord {
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub link: Option<String>,
    pub category: String,
    /// Feed/provider name; `None` for catalog events.
    pub source: Option<String>,
    /// Only set for events.
    pub location: Option<String>,
    pub image_url: Option<String>,
    pub content_hash: String,
}
