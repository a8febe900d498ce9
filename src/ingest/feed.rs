// src/ingest/feed.rs
//! Feed documents (RSS 0.9x/1.0/2.0, Atom) -> `RawEntry` in document order.

use std::collections::BTreeMap;

use atom_syndication::extension::ExtensionMap as AtomExtensionMap;
use rss::extension::ExtensionMap as RssExtensionMap;

use crate::ingest::error::FetchError;
use crate::ingest::types::{MediaRef, RawEntry};

/// Try RSS first, then Atom.
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<RawEntry>, FetchError> {
    let rss_err = match rss::Channel::read_from(bytes) {
        Ok(channel) => return Ok(channel.items().iter().map(rss_entry).collect()),
        Err(e) => e,
    };
    match atom_syndication::Feed::read_from(bytes) {
        Ok(feed) => Ok(feed.entries().iter().map(atom_entry).collect()),
        Err(atom_err) => Err(FetchError::Parse(format!(
            "not rss ({rss_err}) nor atom ({atom_err})"
        ))),
    }
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// `media:content` / `media:thumbnail` from a namespace extension map.
/// Both feed crates use the same prefix -> name -> [element] layout.
fn media_refs<E>(
    media: Option<&BTreeMap<String, Vec<E>>>,
    attrs: impl Fn(&E) -> &BTreeMap<String, String>,
) -> Vec<MediaRef> {
    let Some(media) = media else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for el in media.get("content").into_iter().flatten() {
        let a = attrs(el);
        if let Some(url) = a.get("url") {
            out.push(MediaRef::Content {
                url: url.clone(),
                medium: a.get("medium").cloned(),
                mime: a.get("type").cloned(),
            });
        }
    }
    for el in media.get("thumbnail").into_iter().flatten() {
        if let Some(url) = attrs(el).get("url") {
            out.push(MediaRef::Thumbnail { url: url.clone() });
        }
    }
    out
}

fn rss_media(ext: &RssExtensionMap) -> Vec<MediaRef> {
    media_refs(ext.get("media"), rss::extension::Extension::attrs)
}

fn atom_media(ext: &AtomExtensionMap) -> Vec<MediaRef> {
    media_refs(
        ext.get("media"),
        atom_syndication::extension::Extension::attrs,
    )
}

fn rss_entry(item: &rss::Item) -> RawEntry {
    let mut media = rss_media(item.extensions());
    if let Some(enc) = item.enclosure() {
        media.push(MediaRef::Link {
            href: enc.url().to_string(),
            mime: non_empty(Some(enc.mime_type())),
        });
    }

    // RSS 1.0 / some 2.0 feeds only carry dc:date
    let dc_date = item
        .dublin_core_ext()
        .and_then(|dc| dc.dates().first())
        .map(String::as_str);

    RawEntry {
        title: non_empty(item.title()),
        summary: non_empty(item.description()),
        content: non_empty(item.content()),
        published: non_empty(item.pub_date()).or_else(|| non_empty(dc_date)),
        updated: None,
        link: non_empty(item.link()),
        media,
    }
}

fn atom_entry(entry: &atom_syndication::Entry) -> RawEntry {
    let mut media = atom_media(entry.extensions());
    for link in entry.links() {
        if link.mime_type().is_some() && link.rel() != "alternate" {
            media.push(MediaRef::Link {
                href: link.href().to_string(),
                mime: non_empty(link.mime_type()),
            });
        }
    }

    let link = entry
        .links()
        .iter()
        .find(|l| l.rel() == "alternate")
        .or_else(|| entry.links().first())
        .map(|l| l.href().to_string());

    RawEntry {
        title: non_empty(Some(entry.title().as_str())),
        summary: non_empty(entry.summary().map(|s| s.as_str())),
        content: non_empty(entry.content().and_then(|c| c.value())),
        published: entry.published().map(|d| d.to_rfc3339()),
        updated: Some(entry.updated().to_rfc3339()),
        link: non_empty(link.as_deref()),
        media,
    }
}
