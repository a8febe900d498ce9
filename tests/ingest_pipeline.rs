// tests/ingest_pipeline.rs
//
// Fetcher end to end against fixture feeds: robots, parse, normalize, store.

mod common;

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use common::{fetcher, fixture, temp_store, FixtureTransport};
use space_defense_feed::ingest::Source;
use space_defense_feed::RecordFilter;

const FEED: &str = "https://feeds.test/space.xml";
const ROBOTS: &str = "https://feeds.test/robots.txt";

fn source() -> Source {
    Source::new("Orbital Desk", FEED, "Space Industry")
}

#[tokio::test]
async fn same_story_twice_keeps_one_row_with_later_date() {
    let (_dir, store) = temp_store();
    let transport = Arc::new(FixtureTransport::new().serve(FEED, 200, fixture("duplicate_rss.xml")));
    let f = fetcher(transport.clone(), store.clone());

    let records = f.fetch(&source()).await;
    // two stored writes; the untitled item is skipped
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].content_hash, records[1].content_hash);

    let rows = store.get_news(&RecordFilter::default()).unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.title, "GPS III SV07 reaches orbit");
    assert_eq!(row.description, "Rapid-response launch for Space Systems Command.");
    assert_eq!(row.date, Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 2).unwrap());
    assert_eq!(
        row.link.as_deref(),
        Some("https://feeds.test/articles/gps-iii-sv07?rev=2")
    );
    assert_eq!(row.image_url.as_deref(), Some("https://feeds.test/img/gps.jpg"));
    assert_eq!(row.source.as_deref(), Some("Orbital Desk"));
}

#[tokio::test]
async fn refetch_leaves_deleted_category_reassignment_alone() {
    let (_dir, store) = temp_store();
    let transport = Arc::new(
        FixtureTransport::new().serve(FEED, 200, fixture("mixed_dates_rss.xml")),
    );
    let f = fetcher(transport, store.clone());

    assert!(!f.fetch(&source()).await.is_empty());
    assert!(store.delete_category("Space Industry").unwrap());
    f.fetch(&source()).await;

    let rows = store.get_news(&RecordFilter::default()).unwrap();
    assert!(!rows.is_empty());
    assert!(rows.iter().all(|r| r.category == "Uncategorized"));
}

#[tokio::test]
async fn refetch_is_idempotent() {
    let (_dir, store) = temp_store();
    let transport = Arc::new(FixtureTransport::new().serve(FEED, 200, fixture("duplicate_rss.xml")));
    let f = fetcher(transport.clone(), store.clone());

    f.fetch(&source()).await;
    f.fetch(&source()).await;
    assert_eq!(store.get_news(&RecordFilter::default()).unwrap().len(), 1);
    // robots.txt fetched once, then served from cache
    assert_eq!(transport.hit_count(ROBOTS), 1);
    assert_eq!(transport.hit_count(FEED), 2);
}

#[tokio::test]
async fn dates_normalize_to_utc() {
    let (_dir, store) = temp_store();
    let url = "https://range.test/rss";
    let transport = Arc::new(FixtureTransport::new().serve(url, 200, fixture("mixed_dates_rss.xml")));
    let f = fetcher(transport, store.clone());

    let before = Utc::now();
    let records = f
        .fetch(&Source::new("Range Log", url, "Official Updates"))
        .await;
    assert_eq!(records.len(), 3);

    let at_1430 = Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap();
    assert_eq!(records[0].date, at_1430, "naive is read as UTC");
    assert_eq!(records[1].date, at_1430, "offset converts to the same instant");
    assert!(records[2].date >= before, "garbage falls back to now");

    // relative <img> resolved against the item link
    assert_eq!(
        records[1].image_url.as_deref(),
        Some("https://range.test/img/range.png")
    );
    // no image anywhere: category placeholder
    assert!(records[0]
        .image_url
        .as_deref()
        .unwrap()
        .starts_with("data:image/svg+xml;base64,"));

    // stored and read back at the same instant
    let rows = store.get_news(&RecordFilter::default()).unwrap();
    let offset_row = rows.iter().find(|r| r.title == "Offset timestamp").unwrap();
    assert_eq!(offset_row.date, at_1430);
}

#[tokio::test]
async fn atom_feeds_are_supported() {
    let (_dir, store) = temp_store();
    let url = "https://ops.test/atom";
    let transport = Arc::new(FixtureTransport::new().serve(url, 200, fixture("ops_atom.xml")));
    let f = fetcher(transport, store.clone());

    let records = f
        .fetch(&Source::new("Space Ops", url, "Military Space"))
        .await;
    assert_eq!(records.len(), 1);
    let r = &records[0];
    assert_eq!(r.description, "Missile warning & tracking update.");
    assert_eq!(r.link.as_deref(), Some("https://ops.test/bulletins/delta-4"));
    assert_eq!(r.date, Utc.with_ymd_and_hms(2024, 3, 6, 14, 15, 0).unwrap());
}

#[tokio::test]
async fn robots_disallow_skips_the_feed() {
    let (_dir, store) = temp_store();
    let transport = Arc::new(
        FixtureTransport::new()
            .serve(ROBOTS, 200, "User-agent: *\nDisallow: /\n")
            .serve(FEED, 200, fixture("duplicate_rss.xml")),
    );
    let f = fetcher(transport.clone(), store.clone());

    assert!(f.fetch(&source()).await.is_empty());
    assert_eq!(transport.hit_count(FEED), 0);
    assert!(store.get_news(&RecordFilter::default()).unwrap().is_empty());
}

#[tokio::test]
async fn robots_network_error_fails_open() {
    let (_dir, store) = temp_store();
    let transport = Arc::new(
        FixtureTransport::new()
            .fail(ROBOTS, "connection reset")
            .serve(FEED, 200, fixture("duplicate_rss.xml")),
    );
    let f = fetcher(transport.clone(), store.clone());

    assert_eq!(f.fetch(&source()).await.len(), 2);
    assert_eq!(transport.hit_count(FEED), 1);
}

#[tokio::test]
async fn whole_feed_failures_yield_nothing() {
    let (_dir, store) = temp_store();
    let transport = Arc::new(
        FixtureTransport::new()
            .serve(FEED, 503, "busy")
            .serve("https://feeds.test/html", 200, "<html><body>nope</body></html>")
            .fail("https://down.test/rss", "dns error"),
    );
    let f = fetcher(transport, store.clone());

    assert!(f.fetch(&source()).await.is_empty());
    assert!(f
        .fetch(&Source::new("Html", "https://feeds.test/html", "X"))
        .await
        .is_empty());
    assert!(f
        .fetch(&Source::new("Down", "https://down.test/rss", "X"))
        .await
        .is_empty());
    assert!(f
        .fetch(&Source::new("Bad", "not a url", "X"))
        .await
        .is_empty());
    assert!(store.get_news(&RecordFilter::default()).unwrap().is_empty());
}
