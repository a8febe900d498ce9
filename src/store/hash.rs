// src/store/hash.rs
//! Content fingerprints used for deduplication.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

/// SHA-256 (hex) over the fields serialized as a key-sorted JSON object.
/// Key order of the input does not matter.
pub fn content_hash<'a>(fields: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let sorted: BTreeMap<&str, &str> = fields.into_iter().collect();
    // a map of strings always serializes
    let canonical = serde_json::to_string(&sorted).unwrap_or_default();
    hex::encode(Sha256::digest(canonical.as_bytes()))
}

/// News discriminator is the feed name.
pub fn news_hash(title: &str, description: &str, category: &str, source: &str) -> String {
    content_hash([
        ("title", title),
        ("description", description),
        ("source", source),
        ("category", category),
    ])
}

/// Event discriminator is the location.
pub fn event_hash(title: &str, description: &str, category: &str, location: &str) -> String {
    content_hash([
        ("title", title),
        ("description", description),
        ("location", location),
        ("category", category),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_across_calls() {
        let a = news_hash("GPS III", "Launch", "Space Industry", "SpaceNews");
        let b = news_hash("GPS III", "Launch", "Space Industry", "SpaceNews");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn independent_of_key_order() {
        let forward = content_hash([("a", "1"), ("b", "2"), ("c", "3")]);
        let backward = content_hash([("c", "3"), ("b", "2"), ("a", "1")]);
        assert_eq!(forward, backward);
    }

    #[test]
    fn discriminator_changes_hash() {
        let n1 = news_hash("t", "d", "c", "Feed A");
        let n2 = news_hash("t", "d", "c", "Feed B");
        assert_ne!(n1, n2);
        // same values under a different key are a different item
        assert_ne!(news_hash("t", "d", "c", "x"), event_hash("t", "d", "c", "x"));
    }

    #[test]
    fn field_boundaries_matter() {
        assert_ne!(
            content_hash([("title", "ab"), ("description", "c")]),
            content_hash([("title", "a"), ("description", "bc")])
        );
    }
}
