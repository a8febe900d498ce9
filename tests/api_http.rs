// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.

mod common;

use std::sync::Arc;

use axum::{
    body::{self, Body},
    Router,
};
use http::{Request, StatusCode};
use serde_json::{json, Value as Json};
use tower::ServiceExt as _; // for `oneshot`

use common::{fetcher, fixture, temp_store, FixtureTransport};
use space_defense_feed::briefing::{DisabledSummarizer, NO_RECENT_EVENTS};
use space_defense_feed::ingest::catalog::default_events;
use space_defense_feed::ingest::{IngestionScheduler, Source};
use space_defense_feed::metrics::Metrics;
use space_defense_feed::{router, AppState, Store};

const BODY_LIMIT: usize = 1024 * 1024;
const FEED: &str = "https://feeds.test/space.xml";

fn test_router(store: Store) -> Router {
    let transport =
        Arc::new(FixtureTransport::new().serve(FEED, 200, fixture("duplicate_rss.xml")));
    let scheduler = IngestionScheduler::new(fetcher(transport, store.clone()), 2);
    let state = AppState {
        store,
        scheduler: Arc::new(scheduler),
        sources: Arc::new(vec![Source::new("Orbital Desk", FEED, "Space Industry")]),
        catalog: Arc::new(default_events()),
        summarizer: Arc::new(DisabledSummarizer),
        metrics: Metrics::detached(),
    };
    router(state)
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Json>) -> (StatusCode, Json) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(b.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("build request");

    let resp = app.clone().oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let json = if bytes.is_empty() {
        Json::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Json::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, json)
}

#[tokio::test]
async fn health_is_ok() {
    let (_dir, store) = temp_store();
    let app = test_router(store);
    let (status, body) = call(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Json::String("OK".into()));
}

#[tokio::test]
async fn empty_store_lists_are_empty_arrays() {
    let (_dir, store) = temp_store();
    let app = test_router(store);
    for uri in ["/news", "/events", "/news?category=All"] {
        let (status, body) = call(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body, json!([]), "{uri}");
    }
}

#[tokio::test]
async fn ingest_then_read_back() {
    let (_dir, store) = temp_store();
    let app = test_router(store);

    let (status, summary) = call(&app, "POST", "/ingest", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["news"], 1);
    assert_eq!(summary["events"], 2);

    let (_, news) = call(&app, "GET", "/news", None).await;
    assert_eq!(news.as_array().unwrap().len(), 1);
    assert_eq!(news[0]["title"], "GPS III SV07 reaches orbit");
    assert_eq!(news[0]["date"], "2024-03-05T14:30:02Z");

    let (_, filtered) = call(&app, "GET", "/events?category=Briefing", None).await;
    assert_eq!(filtered.as_array().unwrap().len(), 1);
    assert_eq!(filtered[0]["location"], "Colorado Springs, CO");

    let (_, windowed) = call(
        &app,
        "GET",
        "/news?start=2024-03-06T00:00:00Z&end=2024-03-07T00:00:00Z",
        None,
    )
    .await;
    assert_eq!(windowed, json!([]));

    let (_, searched) = call(&app, "GET", "/news?q=space%20systems", None).await;
    assert_eq!(searched.as_array().unwrap().len(), 1);

    let (status, stats) = call(&app, "GET", "/stats?days=7", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["stats"]["total"], 3);
    assert_eq!(stats["stats"]["unique_categories"], 3);
}

#[tokio::test]
async fn bad_date_query_is_rejected() {
    let (_dir, store) = temp_store();
    let app = test_router(store);
    let (status, _) = call(&app, "GET", "/news?start=yesterday", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn category_admin_round_trip() {
    let (_dir, store) = temp_store();
    let app = test_router(store);

    let (status, created) =
        call(&app, "POST", "/categories", Some(json!({ "name": "Launch" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "Launch");

    let (status, _) = call(
        &app,
        "PUT",
        "/categories/Launch",
        Some(json!({ "new_name": "Launches" })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(
        &app,
        "PUT",
        "/categories/Launches",
        Some(json!({ "new_name": "Uncategorized" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(&app, "DELETE", "/categories/Uncategorized", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&app, "DELETE", "/categories/Launches", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&app, "DELETE", "/categories/Launches", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, list) = call(&app, "GET", "/categories", None).await;
    let names: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Uncategorized"]);
}

#[tokio::test]
async fn briefing_without_recent_items() {
    let (_dir, store) = temp_store();
    let app = test_router(store);
    let (status, body) = call(&app, "GET", "/briefing", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["briefing"], NO_RECENT_EVENTS);
    assert!(body["generated_at"].is_string());
}

#[tokio::test]
async fn metrics_endpoint_renders() {
    let (_dir, store) = temp_store();
    let app = test_router(store);
    let (status, _) = call(&app, "GET", "/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
}
