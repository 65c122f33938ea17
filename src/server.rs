use std::sync::Arc;

use anyhow::Context;
use axum::extract::{DefaultBodyLimit, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::api::{download, listing, upload};
use crate::config::ServerConfig;
use crate::content::AllowedExtensions;
use crate::metrics::{Metrics, MetricsCollector};
use crate::storage::{LocalStorage, ObjectStore, StoredObject};
use crate::token::TokenSigner;
use crate::utils::names;

/// Everything a handler needs, built once at startup.
pub struct AppState {
    pub config: ServerConfig,
    pub allowed: AllowedExtensions,
    pub signer: TokenSigner,
    pub store: Arc<dyn ObjectStore>,
    pub metrics: MetricsCollector,
}

impl AppState {
    pub fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let store = Arc::new(LocalStorage::new(config.data_directory.clone()));
        Self::with_store(config, store)
    }

    pub fn with_store(config: ServerConfig, store: Arc<dyn ObjectStore>) -> anyhow::Result<Self> {
        let signer = TokenSigner::new(config.token_secret.as_bytes())?;
        Ok(Self {
            allowed: config.allowed(),
            signer,
            store,
            metrics: MetricsCollector::new(),
            config,
        })
    }

    /// `{base_url}/d/{id}/{sanitized name}?token={hmac}`
    pub fn link_for(&self, object: &StoredObject) -> String {
        format!(
            "{}/d/{}/{}?token={}",
            self.config.link_prefix(),
            object.id,
            names::sanitize(&object.original_name),
            self.signer.sign(&object.id),
        )
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_upload_bytes();

    Router::new()
        .route("/health", get(handle_health))
        .route("/metrics", get(handle_metrics))
        .route("/upload", post(upload::handle_form_upload))
        .route("/api/upload", post(upload::handle_api_upload))
        .route("/api/files", get(listing::handle_list_files))
        .route("/d/:id/:name", get(download::handle_download))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_on(config: ServerConfig) -> anyhow::Result<()> {
    let addr = config.listen_address.clone();
    if config.uses_dev_secret() {
        warn!("TOKEN_SECRET is the development default; download links are forgeable");
    }

    let state = Arc::new(AppState::new(config)?);
    info!(
        "Storing uploads in {:?}, links under {}",
        state.config.data_directory,
        state.config.link_prefix()
    );
    info!(
        "Accepting {} ({} bytes max)",
        state.allowed.iter().collect::<Vec<_>>().join(" "),
        state.config.max_upload_bytes()
    );
    let app = build_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated unexpectedly")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

async fn handle_health() -> &'static str {
    "OK"
}

async fn handle_metrics(State(state): State<Arc<AppState>>) -> Json<Metrics> {
    Json(state.metrics.get_metrics())
}
