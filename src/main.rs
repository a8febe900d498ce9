//! Space-defense feed service: background ingestion plus the read API.

use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::info;

use space_defense_feed::briefing::build_summarizer;
use space_defense_feed::config::{load_events, load_sources, Settings};
use space_defense_feed::metrics::Metrics;
use space_defense_feed::{
    build_scheduler, http_transport, init_tracing, router, AppState, PeriodicRunner, Store,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let settings = Settings::from_env().context("loading settings")?;
    let metrics = Metrics::init()?;

    let store = Store::open(&settings.database_url)
        .with_context(|| format!("opening database {}", settings.database_url))?;
    let sources = Arc::new(load_sources(&settings.sources_path)?);
    let catalog = Arc::new(load_events(&settings.events_path)?);
    info!(sources = sources.len(), events = catalog.len(), "configuration loaded");

    let cancel = CancellationToken::new();
    let scheduler = Arc::new(
        build_scheduler(&settings, store.clone(), http_transport(&settings)?)
            .with_cancellation(cancel.child_token()),
    );

    let runner = PeriodicRunner::new(
        scheduler.clone(),
        sources.clone(),
        catalog.clone(),
        settings.ingest_interval,
    )
    .spawn(cancel.clone());

    let state = AppState {
        store,
        scheduler,
        sources,
        catalog,
        summarizer: build_summarizer(&settings.briefing),
        metrics,
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(settings.bind_addr)
        .await
        .with_context(|| format!("binding {}", settings.bind_addr))?;
    info!(addr = %settings.bind_addr, "listening");

    let shutdown = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
            shutdown.cancel();
        })
        .await
        .context("http server")?;

    cancel.cancel();
    if let Err(e) = runner.await {
        tracing::warn!(error = %e, "runner task ended abnormally");
    }
    info!("bye");
    Ok(())
}
