// src/ingest/catalog.rs
//! Internal event catalog (events that do not come from a feed).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ingest::normalize::clean_html;
use crate::ingest::types::CanonicalRecord;
use crate::store::hash::event_hash;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogEvent {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub location: String,
    /// Unset means "now" at refresh time. The date is not part of the
    /// event hash, so re-running a refresh never duplicates.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

impl CatalogEvent {
    pub fn to_record(&self, now: DateTime<Utc>) -> CanonicalRecord {
        let title = clean_html(&self.title);
        let description = clean_html(&self.description);
        let location = self.location.trim().to_string();
        let content_hash = event_hash(&title, &description, &self.category, &location);
        CanonicalRecord {
            title,
            description,
            date: self.date.unwrap_or(now),
            link: None,
            category: self.category.clone(),
            source: None,
            location: Some(location).filter(|l| !l.is_empty()),
            image_url: None,
            content_hash,
        }
    }
}

/// Built-in catalog used when no events file is configured.
pub fn default_events() -> Vec<CatalogEvent> {
    vec![
        CatalogEvent {
            title: "Space Force Training Program".into(),
            description: "Annual training program for Space Force personnel".into(),
            category: "Training".into(),
            location: "Virtual Event".into(),
            date: None,
        },
        CatalogEvent {
            title: "Space Systems Command Briefing".into(),
            description: "Monthly briefing on space systems and operations".into(),
            category: "Briefing".into(),
            location: "Colorado Springs, CO".into(),
            date: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn hash_ignores_date() {
        let ev = &default_events()[1];
        let now = Utc::now();
        let a = ev.to_record(now);
        let b = ev.to_record(now + Duration::days(3));
        assert_eq!(a.content_hash, b.content_hash);
        assert_eq!(a.location.as_deref(), Some("Colorado Springs, CO"));
        assert!(a.source.is_none());
    }
}
