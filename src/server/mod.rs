//! Read-only JSON API over the advertisement store.

pub mod handlers;
pub mod types;

use crate::config::Config;
use crate::run_guard::RunGuard;
use crate::store::AdvertisementStore;
use anyhow::{Context, Result};
use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub store: AdvertisementStore,
    pub config: Arc<Config>,
    pub guard: Arc<RunGuard>,
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/listings", get(handlers::listings))
        .route("/api/listings/top", get(handlers::top_listings))
        .route("/api/statistics", get(handlers::statistics))
        .route("/api/scheduler", get(handlers::scheduler_status))
        .route("/api/scrape/now", post(handlers::trigger_scrape))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind and run the API server.
pub async fn serve(state: AppState) -> Result<()> {
    let addr: SocketAddr = state
        .config
        .http
        .listen_addr
        .parse()
        .context("Invalid HTTP listen address")?;

    let app = create_router(state);
    let listener = TcpListener::bind(&addr)
        .await
        .context("Failed to bind HTTP server")?;

    info!("Listing API available on http://{}", addr);
    axum::serve(listener, app).await.context("HTTP server error")
}
