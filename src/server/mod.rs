//! HTTP service.
//!
//! | Route                     | Handler                         |
//! |---------------------------|---------------------------------|
//! | `GET  /health`            | liveness probe                  |
//! | `GET  /`, `GET /api`      | service metadata                |
//! | `GET  /app`               | browser client                  |
//! | `POST /extract`           | extract                         |
//! | `POST /extract-and-clean` | extract + pattern cleaner       |
//! | `POST /extract-with-ai`   | extract + AI cleaner            |
//! | `POST /clean`             | pattern cleaner on posted text  |
//!
//! Requests share nothing mutable: [`AppState`] holds the configuration,
//! the extractor and the provider clients, all read-only after startup.

pub mod error;
pub mod form;
pub mod handlers;

use std::future::Future;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::{AiModel, ServerConfig};
use crate::error::ExtractError;
use crate::pipeline::extract::{PdfiumExtractor, TextExtractor};
use crate::providers::ProviderSet;

/// Process-wide, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub extractor: Arc<dyn TextExtractor>,
    pub providers: Arc<ProviderSet>,
}

impl AppState {
    /// Production state: pdfium extractor and real provider clients.
    pub fn from_config(config: ServerConfig) -> Result<Self, ExtractError> {
        let providers = ProviderSet::from_config(&config)?;
        let extractor = PdfiumExtractor::new(config.pdfium_library_path.clone());
        Ok(Self::new(config, Arc::new(extractor), providers))
    }

    /// State from explicit parts; tests inject stubs here.
    pub fn new(
        config: ServerConfig,
        extractor: Arc<dyn TextExtractor>,
        providers: ProviderSet,
    ) -> Self {
        Self {
            config: Arc::new(config),
            extractor,
            providers: Arc::new(providers),
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;
    Router::new()
        .route("/", get(handlers::service_info))
        .route("/api", get(handlers::service_info))
        .route("/health", get(handlers::health))
        .route("/app", get(handlers::app_page))
        .route("/app/app.js", get(handlers::app_script))
        .route("/extract", post(handlers::extract))
        .route("/extract-and-clean", post(handlers::extract_and_clean))
        .route("/extract-with-ai", post(handlers::extract_with_ai))
        .route("/clean", post(handlers::clean))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `state` on `listener` until `shutdown` resolves.
pub async fn serve_listener(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ExtractError> {
    let app = router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ExtractError::Internal(format!("server error: {e}")))
}

/// Bind `config.bind_addr()` and serve until Ctrl-C.
pub async fn serve(config: ServerConfig) -> Result<(), ExtractError> {
    let addr = config.bind_addr();
    let state = AppState::from_config(config)?;
    log_startup(&state).await;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ExtractError::Internal(format!("Failed to bind to {addr}: {e}")))?;
    info!("PDF extraction service listening on http://{}", addr);
    info!("Browser client at http://{}/app", addr);

    serve_listener(listener, state, shutdown_signal()).await
}

/// Report what this instance can do. Never fails the startup.
async fn log_startup(state: &AppState) {
    let configured: Vec<&str> = AiModel::ALL
        .into_iter()
        .filter(|m| state.config.credential_for(*m).is_some())
        .map(|m| m.as_str())
        .collect();
    if configured.is_empty() {
        info!("No server-side AI credentials; clients must send api_key");
    } else {
        info!("Server-side AI credentials for: {}", configured.join(", "));
    }

    let probe = PdfiumExtractor::new(state.config.pdfium_library_path.clone());
    match tokio::task::spawn_blocking(move || probe.bind().map(|_| ())).await {
        Ok(Ok(())) => info!("pdfium library found"),
        Ok(Err(e)) => warn!("{} Extraction routes will answer 503.", e),
        Err(e) => warn!("pdfium probe failed: {}", e),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
