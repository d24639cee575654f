//! Server initialization and run loop

use super::config::AppConfig;
use super::loader::load_config;
use super::providers::resolve_provider;
use crate::middleware::rate_limit::RateLimitLayer;
use anyhow::{Context, Result};
use axum::extract::{DefaultBodyLimit, Extension};
use axum::Router;
use homefix_core::HomeRepairService;
use homefix_store::Store;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Build the service from configuration
pub fn build_service(config: &AppConfig) -> Result<Arc<HomeRepairService>> {
    let provider = resolve_provider(&config.llm)?;
    Ok(Arc::new(HomeRepairService::with_config(
        provider,
        config.service_config(),
    )))
}

/// Open the store when a database URL is configured
async fn init_store(config: &AppConfig) -> Option<Store> {
    let url = config.database.url()?;

    if let Some(path) = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .filter(|path| !path.starts_with(':'))
    {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!("Failed to create database directory: {}", e);
            }
        }
    }

    match Store::connect(url).await {
        Ok(store) => Some(store),
        Err(e) => {
            warn!("Persistence disabled, failed to open database: {}", e);
            None
        }
    }
}

/// Build the main router with all endpoints and layers
pub fn build_router(
    service: Arc<HomeRepairService>,
    store: Option<Store>,
    config: &AppConfig,
) -> Router {
    let rate_limit_layer = RateLimitLayer::new(&config.rate_limit);
    if config.rate_limit.enabled {
        rate_limit_layer.state().spawn_cleanup();
        info!(
            "Rate limiting ENABLED ({}rpm/client, {}rpm global)",
            config.rate_limit.requests_per_minute, config.rate_limit.global_requests_per_minute
        );
    } else {
        info!("Rate limiting DISABLED");
    }

    let app = Router::new()
        .merge(crate::api::health_routes())
        .merge(crate::api::api_router())
        .layer(Extension(service))
        .layer(DefaultBodyLimit::max(config.server.max_body_bytes))
        .layer(rate_limit_layer)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    match store {
        Some(store) => app.layer(Extension(store)),
        None => app,
    }
}

/// Load configuration and run the HTTP server until shutdown
pub async fn run() -> Result<()> {
    let config = load_config()?;

    let service = build_service(&config)?;
    info!(provider = %service.provider_name(), "Diagnosis service ready");

    let store = init_store(&config).await;
    if store.is_none() {
        info!("Persistence DISABLED; profile and history routes will answer 503");
    }

    let app = build_router(service, store, &config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    info!("HTTP server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("HTTP server error")?;

    info!("Homefix shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}
