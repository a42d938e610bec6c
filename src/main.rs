// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use anyhow::Context;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::dashboard_store::DashboardStore;
use crate::application::key_value_store::KeyValueStore;
use crate::application::refresh_scheduler::RefreshScheduler;
use crate::application::response_cache::{ResponseCache, SystemClock};
use crate::application::widget_service::WidgetService;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::file_store::FileKeyValueStore;
use crate::infrastructure::http_data_source::HttpDataSource;
use crate::infrastructure::indian_api::IndianApiClient;
use crate::infrastructure::memory_store::MemoryKeyValueStore;
use crate::presentation::app_state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("finboard=info,tower_http=info")),
        )
        .init();

    // Load configuration
    let app_config = load_app_config().context("Failed to load configuration")?;
    if app_config.indianapi.api_key.is_none() {
        tracing::warn!("INDIANAPI_API_KEY is not set; proxy routes will answer 500");
    }

    // Outbound fetches and the response cache
    let clock = Arc::new(SystemClock);
    let source = Arc::new(HttpDataSource::new(app_config.fetch.timeout())?);
    let cache = Arc::new(ResponseCache::new(source, clock.clone()));

    // Persisted dashboard
    let storage: Arc<dyn KeyValueStore> = match app_config.storage.persistent_directory() {
        Some(directory) => Arc::new(FileKeyValueStore::new(directory)),
        None => {
            tracing::warn!("No storage directory configured; dashboard will not survive restarts");
            Arc::new(MemoryKeyValueStore::default())
        }
    };
    let store = Arc::new(DashboardStore::load(storage).await);

    // Services (application layer)
    let scheduler = Arc::new(RefreshScheduler::new(cache.clone(), store.clone()));
    scheduler.sync().await;
    let widget_service = WidgetService::new(
        cache.clone(),
        store.clone(),
        scheduler.clone(),
        clock,
        app_config.cache.default_ttl_ms,
    );
    let indian_api = IndianApiClient::new(
        app_config.indianapi.base_url.clone(),
        app_config.indianapi.api_key.clone(),
        app_config.fetch.timeout(),
    )?;

    // Create application state
    let state = Arc::new(AppState {
        widget_service,
        store,
        cache,
        scheduler: scheduler.clone(),
        indian_api,
    });

    // Build router (presentation layer)
    let router = presentation::router(state).layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = app_config
        .server
        .bind_address
        .parse()
        .with_context(|| format!("Invalid bind address {}", app_config.server.bind_address))?;
    tracing::info!("Starting finboard service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    scheduler.shutdown().await;
    Ok(())
}
