// src/ingest/normalize.rs
//! Raw feed entry -> canonical record: plain text, timezone-aware dates and
//! an image resolved through the fallback chain.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::OnceCell;
use regex::Regex;
use time::{format_description::well_known::Rfc2822, OffsetDateTime};
use tracing::warn;
use url::Url;

use crate::ingest::error::NormalizeError;
use crate::ingest::fallback_image::fallback_image_url;
use crate::ingest::types::{CanonicalRecord, MediaRef, RawEntry, Source};
use crate::store::hash::news_hash;

/// Strip markup and collapse whitespace. Block elements and `<br>` become spaces.
pub fn clean_html(s: &str) -> String {
    static RE_HIDDEN: OnceCell<Regex> = OnceCell::new();
    static RE_BLOCK: OnceCell<Regex> = OnceCell::new();
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();

    // 1) Drop comments and script/style bodies entirely
    let re_hidden = RE_HIDDEN.get_or_init(|| {
        Regex::new(r"(?is)<!--.*?-->|<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>")
            .expect("hidden-content regex")
    });
    let out = re_hidden.replace_all(s, " ");

    // 2) Line-breaking elements keep a word boundary
    let re_block = RE_BLOCK.get_or_init(|| {
        Regex::new(
            r"(?i)</?(br|p|div|li|ul|ol|h[1-6]|tr|td|th|table|blockquote|figure|figcaption|section|article|header|footer|hr)\b[^>]*>",
        )
        .expect("block-tag regex")
    });
    let out = re_block.replace_all(&out, " ");

    // 3) Everything else is inline
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?s)</?[a-zA-Z!][^>]*>").expect("tag regex"));
    let out = re_tags.replace_all(&out, "");

    // 4) Entities after tags, so escaped markup stays text
    let out = html_escape::decode_html_entities(&out);

    // 5) Collapse whitespace (NBSP included)
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse a feed timestamp in any of the common formats. Values without an
/// offset are taken as UTC.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc2822) {
        if let Some(utc) = DateTime::<Utc>::from_timestamp(dt.unix_timestamp(), dt.nanosecond()) {
            return Some(utc);
        }
    }
    // chrono also understands obsolete zone names (GMT, EST, PDT, ...)
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    const WITH_OFFSET: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f%z",
        "%Y-%m-%d %H:%M:%S%.f%z",
        "%Y-%m-%d %H:%M:%S %z",
        "%a, %d %b %Y %H:%M %z",
        "%d %b %Y %H:%M:%S %z",
    ];
    for fmt in WITH_OFFSET {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    const NAIVE: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
        "%a, %d %b %Y %H:%M:%S",
        "%d %b %Y %H:%M:%S",
        "%B %d, %Y %H:%M",
        "%m/%d/%Y %I:%M:%S %p",
        "%m/%d/%Y %H:%M",
    ];
    for fmt in NAIVE {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc());
        }
    }

    const DATE_ONLY: &[&str] = &["%Y-%m-%d", "%B %d, %Y", "%d %B %Y", "%b %d, %Y", "%m/%d/%Y"];
    for fmt in DATE_ONLY {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }

    None
}

/// Entry timestamp: published, else updated, else `now` (with a warning).
pub fn resolve_date(entry: &RawEntry, source_name: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    let Some(raw) = entry.published.as_deref().or(entry.updated.as_deref()) else {
        return now;
    };
    match parse_date(raw) {
        Some(dt) => dt,
        None => {
            warn!(target: "ingest", source = source_name, raw, "unparseable entry date; using now");
            now
        }
    }
}

fn is_image_mime(mime: Option<&str>) -> bool {
    mime.is_some_and(|m| m.trim().to_ascii_lowercase().starts_with("image/"))
}

/// Image declared in feed metadata: media:content, then media:thumbnail,
/// then a link/enclosure typed `image/*`.
pub fn featured_image(media: &[MediaRef]) -> Option<String> {
    let content = media.iter().find_map(|m| match m {
        MediaRef::Content { url, medium, mime } => {
            let declared_other = medium.as_deref().is_some_and(|md| md != "image")
                || mime.as_deref().is_some_and(|mt| !is_image_mime(Some(mt)));
            (!declared_other && !url.trim().is_empty()).then(|| url.clone())
        }
        _ => None,
    });
    let thumbnail = || {
        media.iter().find_map(|m| match m {
            MediaRef::Thumbnail { url } if !url.trim().is_empty() => Some(url.clone()),
            _ => None,
        })
    };
    let typed_link = || {
        media.iter().find_map(|m| match m {
            MediaRef::Link { href, mime } if is_image_mime(mime.as_deref()) => Some(href.clone()),
            _ => None,
        })
    };
    content.or_else(thumbnail).or_else(typed_link)
}

/// File stems and path segments that mark a tracking image.
const TRACKER_NAMES: [&str; 4] = ["pixel", "spacer", "1x1", "transparent"];

/// A tag sized 1px in either dimension, or a source whose file name or a
/// path segment is a known tracker name. Host names are not inspected.
fn is_tracking_pixel(tag: &str, src: &str) -> bool {
    static RE_ONE_PX: OnceCell<Regex> = OnceCell::new();
    let re_one_px = RE_ONE_PX.get_or_init(|| {
        Regex::new(r#"(?i)\b(?:width|height)\s*=\s*["']?1(?:px)?(?:["'\s/>]|$)"#)
            .expect("1px regex")
    });
    if re_one_px.is_match(tag) {
        return true;
    }

    let path = match Url::parse(src) {
        Ok(u) => u.path().to_string(),
        Err(_) => src.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    path.split('/')
        .filter(|seg| !seg.is_empty())
        .map(|seg| seg.split('.').next().unwrap_or_default().to_ascii_lowercase())
        .any(|stem| TRACKER_NAMES.contains(&stem.as_str()))
}

/// First `<img src>` in an HTML fragment, skipping tracking pixels.
/// Relative sources are resolved against `base` when given.
pub fn first_html_image(html: &str, base: Option<&str>) -> Option<String> {
    static RE_IMG: OnceCell<Regex> = OnceCell::new();
    static RE_SRC: OnceCell<Regex> = OnceCell::new();
    let re_img = RE_IMG.get_or_init(|| Regex::new(r"(?is)<img\b[^>]*>").expect("img regex"));
    let re_src = RE_SRC.get_or_init(|| {
        Regex::new(r#"(?is)\bsrc\s*=\s*["']([^"']+)["']"#).expect("img src regex")
    });

    re_img
        .find_iter(html)
        .filter_map(|tag| {
            let tag = tag.as_str();
            let src = re_src.captures(tag)?.get(1)?;
            let src = html_escape::decode_html_entities(src.as_str().trim()).to_string();
            (!is_tracking_pixel(tag, &src)).then_some(src)
        })
        .find_map(|src| {
            if Url::parse(&src).is_ok() {
                return Some(src);
            }
            match base.and_then(|b| Url::parse(b).ok()) {
                Some(b) => b.join(&src).ok().map(|u| u.to_string()),
                None => Some(src),
            }
        })
}

/// Raw entry -> canonical news record.
pub fn normalize_entry(
    entry: &RawEntry,
    source: &Source,
    now: DateTime<Utc>,
) -> Result<CanonicalRecord, NormalizeError> {
    let title = clean_html(entry.title.as_deref().unwrap_or_default());
    if title.is_empty() {
        return Err(NormalizeError::EmptyTitle);
    }

    let description_html = entry
        .summary
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .or(entry.content.as_deref())
        .unwrap_or_default();
    let description = clean_html(description_html);

    let link = entry
        .link
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string);

    let image_url = featured_image(&entry.media)
        .or_else(|| first_html_image(description_html, link.as_deref()))
        .or_else(|| {
            entry
                .content
                .as_deref()
                .and_then(|c| first_html_image(c, link.as_deref()))
        })
        .unwrap_or_else(|| fallback_image_url(&source.category));

    let date = resolve_date(entry, &source.name, now);
    let content_hash = news_hash(&title, &description, &source.category, &source.name);

    Ok(CanonicalRecord {
        title,
        description,
        date,
        link,
        category: source.category.clone(),
        source: Some(source.name.clone()),
        location: None,
        image_url: Some(image_url),
        content_hash,
    })
}
