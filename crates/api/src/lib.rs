//! Notes API Server
//!
//! Serves the notes page and the `/entries` JSON API on top of the entry store.

use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

pub mod config;
pub mod error;
pub mod pages;
pub mod routes;

pub use crate::config::AppConfig;
pub use error::ApiError;

use pages::Pages;
use storage::EntryStore;

/// Application state shared across handlers
pub struct AppState {
    /// Entry store
    pub store: EntryStore,
    /// Compiled page templates
    pub pages: Pages,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// Prometheus handle when metrics are enabled
    pub metrics: Option<PrometheusHandle>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Create new application state around an opened store
    pub fn new(store: EntryStore) -> Result<Self, handlebars::TemplateError> {
        Ok(Self {
            store,
            pages: Pages::new()?,
            static_dir: PathBuf::from("static"),
            metrics: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        })
    }

    /// Serve `/static` from `dir`
    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = dir.into();
        self
    }

    /// Expose `handle` on `/metrics`
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub entry_count: Option<i64>,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let static_files = ServeDir::new(&state.static_dir);

    Router::new()
        .route("/", get(routes::index::handle_index))
        .route(
            "/entries",
            get(routes::entries::handle_list).post(routes::entries::handle_create),
        )
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .nest_service("/static", static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let entry_count = match state.store.count_entries().await {
        Ok(count) => Some(count),
        Err(e) => {
            warn!("Health check could not reach store: {}", e);
            None
        }
    };

    let (status, label) = match entry_count {
        Some(_) => (StatusCode::OK, "healthy"),
        None => (StatusCode::SERVICE_UNAVAILABLE, "degraded"),
    };

    let response = HealthResponse {
        status: label.to_string(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        entry_count,
    };

    (status, Json(response))
}

/// Prometheus scrape handler
async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Initialize logging
pub fn init_logging(level: &str) {
    let level = level.parse::<Level>().unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        debug!("Tracing subscriber already installed");
    }
}

/// Open the store, prepare the schema and serve until Ctrl-C.
///
/// A store that cannot be opened or whose schema cannot be created aborts
/// startup before the listener is bound.
pub async fn run_server(config: &AppConfig) -> anyhow::Result<()> {
    let store = EntryStore::connect(&config.store_config())
        .await
        .context("failed to open entry store")?;
    store
        .ensure_schema()
        .await
        .context("failed to create entries table")?;

    let mut state = AppState::new(store.clone())?.with_static_dir(&config.static_dir);
    if config.metrics_enabled {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("failed to install metrics recorder")?;
        state = state.with_metrics(handle);
    }

    let app = create_router(Arc::new(state));

    info!("Starting API server on {}", config.listen_addr);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}


#[cfg(test)]
mod tests {
    use super::test_support::{body_json, body_text, get, test_app};
    use super::*;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_reports_count() {
        let (app, state, _dir) = test_app().await;
        state.store.create_entry("one").await.unwrap();

        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["entry_count"], 1);
    }

    #[tokio::test]
    async fn test_health_degraded_when_store_closed() {
        let (app, state, _dir) = test_app().await;
        state.store.close().await;

        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(response).await["status"], "degraded");
    }

    #[tokio::test]
    async fn test_metrics_disabled_by_default() {
        let (app, _state, _dir) = test_app().await;

        let response = app.oneshot(get("/metrics")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_static_files_served() {
        let (app, _state, dir) = test_app().await;
        std::fs::write(dir.path().join("app.js"), "console.log('hi');").unwrap();

        let response = app.clone().oneshot(get("/static/app.js")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "console.log('hi');");

        let response = app.oneshot(get("/static/missing.js")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_init_logging_twice() {
        init_logging("debug");
        init_logging("not-a-level");
    }
}
