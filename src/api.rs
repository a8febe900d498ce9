// src/api.rs
//! Read API over the store plus category admin and on-demand ingestion.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::analytics::{
    category_trends, daily_frequency, record_stats, search_records, CategoryDailyCount,
    DailyCount, RecordStats, DEFAULT_TREND_DAYS,
};
use crate::briefing::{generate_briefing, DynSummarizer};
use crate::ingest::catalog::CatalogEvent;
use crate::ingest::scheduler::{CycleSummary, IngestionScheduler};
use crate::ingest::types::{CanonicalRecord, Source};
use crate::metrics::Metrics;
use crate::store::{Category, RecordFilter, Store, StoreError};

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub scheduler: Arc<IngestionScheduler>,
    pub sources: Arc<Vec<Source>>,
    pub catalog: Arc<Vec<CatalogEvent>>,
    pub summarizer: DynSummarizer,
    pub metrics: Metrics,
}

pub fn router(state: AppState) -> Router {
    let metrics = state.metrics.router();
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/news", get(list_news))
        .route("/events", get(list_events))
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/{name}",
            put(rename_category).delete(delete_category),
        )
        .route("/sources", get(list_sources))
        .route("/stats", get(stats))
        .route("/briefing", get(briefing))
        .route("/ingest", post(ingest_now))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
        .merge(metrics)
}

/// Handler error mapped to a status code and a short message.
#[derive(Debug)]
pub struct ApiError(StoreError);

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            StoreError::Invalid(_) => StatusCode::BAD_REQUEST,
            StoreError::Conflict(_) => StatusCode::CONFLICT,
            _ => {
                tracing::error!(error = %self.0, "store failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let msg = match status {
            StatusCode::INTERNAL_SERVER_ERROR => "storage error".to_string(),
            _ => self.0.to_string(),
        };
        (status, Json(serde_json::json!({ "error": msg }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub category: Option<String>,
    /// Free-text search on title/description.
    pub q: Option<String>,
    /// Trend window for `/stats`.
    pub days: Option<i64>,
}

impl ListQuery {
    fn filter(&self) -> RecordFilter {
        RecordFilter {
            start: self.start,
            end: self.end,
            category: self.category.clone(),
        }
    }

    fn search(&self, records: Vec<CanonicalRecord>) -> Vec<CanonicalRecord> {
        match self.q.as_deref() {
            Some(q) => search_records(records, q),
            None => records,
        }
    }
}

async fn read_news(store: &Store, filter: RecordFilter) -> Result<Vec<CanonicalRecord>, StoreError> {
    store.run(move |s| s.get_news(&filter)).await
}

async fn read_events(
    store: &Store,
    filter: RecordFilter,
) -> Result<Vec<CanonicalRecord>, StoreError> {
    store.run(move |s| s.get_events(&filter)).await
}

/// News and events together, newest first.
async fn read_all(state: &AppState, q: &ListQuery) -> Result<Vec<CanonicalRecord>, StoreError> {
    let mut all = read_news(&state.store, q.filter()).await?;
    all.extend(read_events(&state.store, q.filter()).await?);
    all.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(q.search(all))
}

async fn list_news(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> ApiResult<Json<Vec<CanonicalRecord>>> {
    let rows = read_news(&state.store, q.filter()).await?;
    Ok(Json(q.search(rows)))
}

async fn list_events(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> ApiResult<Json<Vec<CanonicalRecord>>> {
    let rows = read_events(&state.store, q.filter()).await?;
    Ok(Json(q.search(rows)))
}

async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.store.run(|s| s.list_categories()).await?))
}

#[derive(Deserialize)]
struct NewCategory {
    name: String,
}

async fn create_category(
    State(state): State<AppState>,
    Json(body): Json<NewCategory>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let name = body.name.trim().to_string();
    let lookup = name.clone();
    let id = state.store.run(move |s| s.ensure_category(&lookup)).await?;
    Ok((StatusCode::CREATED, Json(Category { id, name })))
}

#[derive(Deserialize)]
struct RenameCategory {
    new_name: String,
}

async fn rename_category(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<RenameCategory>,
) -> ApiResult<StatusCode> {
    let renamed = state
        .store
        .run(move |s| s.rename_category(&name, &body.new_name))
        .await?;
    Ok(if renamed {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    })
}

async fn delete_category(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<StatusCode> {
    let deleted = state.store.run(move |s| s.delete_category(&name)).await?;
    Ok(if deleted {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    })
}

async fn list_sources(State(state): State<AppState>) -> Json<Vec<Source>> {
    Json(state.sources.as_ref().clone())
}

#[derive(Serialize)]
struct StatsResp {
    stats: RecordStats,
    daily_frequency: Vec<DailyCount>,
    category_trends: Vec<CategoryDailyCount>,
}

async fn stats(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> ApiResult<Json<StatsResp>> {
    let all = read_all(&state, &q).await?;
    let now = Utc::now();
    let days = q.days.unwrap_or(DEFAULT_TREND_DAYS).clamp(1, 366);
    Ok(Json(StatsResp {
        stats: record_stats(&all),
        daily_frequency: daily_frequency(&all, now, days),
        category_trends: category_trends(&all, now, days),
    }))
}

#[derive(Serialize)]
struct BriefingResp {
    generated_at: DateTime<Utc>,
    briefing: String,
}

async fn briefing(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> ApiResult<Json<BriefingResp>> {
    let all = read_all(&state, &q).await?;
    let now = Utc::now();
    let text = generate_briefing(&all, state.summarizer.as_ref(), now).await;
    Ok(Json(BriefingResp {
        generated_at: now,
        briefing: text,
    }))
}

async fn ingest_now(State(state): State<AppState>) -> ApiResult<Json<CycleSummary>> {
    let summary = state
        .scheduler
        .run_full_cycle(&state.sources, &state.catalog)
        .await?;
    Ok(Json(summary))
}
