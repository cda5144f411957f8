use anyhow::{Context, Result};
use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, Method, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use super::metrics::{self, MetricsSnapshot, RequestMetrics};
use super::{assets, handlers, routes};
use crate::backup::{BackupManager, DAILY_BACKUP_HOUR};
use crate::config::ServerConfig;
use crate::store::Datastore;
use crate::uploads::{self, PhotoStore};

/// Server state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub datastore: Arc<Datastore>,
    pub backups: Arc<BackupManager>,
    pub photos: Arc<PhotoStore>,
    pub metrics: Arc<RequestMetrics>,
    pub body_limit: usize,
}

impl AppState {
    /// Open the data directory and wire up backups as configured
    pub async fn from_config(config: &ServerConfig) -> crate::error::Result<Self> {
        let datastore = Datastore::open(&config.data_dir).await?;
        let backups = BackupManager::new(&config.data_dir, &config.backup_dir)
            .with_max_backups(config.max_backups);
        Ok(Self {
            datastore: Arc::new(datastore),
            backups: Arc::new(backups),
            photos: Arc::new(PhotoStore::new(&config.upload_dir)),
            metrics: Arc::new(RequestMetrics::new()),
            body_limit: config.body_limit,
        })
    }
}

/// Intake HTTP server instance
pub struct IntakeServer {
    config: ServerConfig,
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    service: String,
    version: String,
}

impl IntakeServer {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Run until Ctrl-C
    pub async fn run(self) -> Result<()> {
        let state = AppState::from_config(&self.config)
            .await
            .with_context(|| {
                format!(
                    "Failed to open data directory {}",
                    self.config.data_dir.display()
                )
            })?;

        let daily_backups = self
            .config
            .auto_backup
            .then(|| Arc::clone(&state.backups).spawn_daily(DAILY_BACKUP_HOUR));

        let app = create_router(state, &self.config);

        let addr = self.config.socket_addr();
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind to {}", addr))?;

        tracing::info!("Intake server listening on http://{}", addr);
        tracing::info!("Admin dashboard: http://{}/admin/", addr);
        tracing::info!("Data directory: {}", self.config.data_dir.display());
        if let Some(dir) = &self.config.static_dir {
            tracing::info!("Static site: {}", dir.display());
        }

        let served = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await;

        if let Some(task) = daily_backups {
            task.abort();
        }
        served.context("Server error")?;

        tracing::info!("Server stopped");
        Ok(())
    }
}

/// Create the Axum router with all routes and middleware
pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/info", get(handlers::get_info))
        .route("/metrics", get(metrics_handler))
        .merge(routes::api_routes());

    let router = Router::new()
        .route("/health", get(health_handler))
        .route(
            "/submit-registration",
            post(handlers::submit_registration).layer(DefaultBodyLimit::max(
                uploads::registration_body_limit(config.body_limit),
            )),
        )
        .route("/admin", get(admin_redirect))
        .route("/admin/", get(admin_redirect))
        .route("/admin/*path", get(assets::admin_asset))
        .nest("/api", api_routes);

    // Unclaimed paths go to the public site when one is configured
    let router = match &config.static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router.fallback(not_found_handler),
    };

    let request_metrics = Arc::clone(&state.metrics);
    router
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.body_limit))
        .layer(middleware::from_fn_with_state(
            request_metrics,
            metrics::track_requests,
        ))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

async fn admin_redirect() -> impl IntoResponse {
    (
        StatusCode::MOVED_PERMANENTLY,
        [(header::LOCATION, "/admin/index.html")],
    )
}

/// Health check handler
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "intake-desk".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn metrics_handler(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

/// 404 Not Found handler
pub(crate) async fn not_found_handler() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": "Not found",
            "code": "NOT_FOUND"
        })),
    )
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            service: "intake-desk".to_string(),
            version: "1.0.0".to_string(),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("intake-desk"));
    }

    #[tokio::test]
    async fn test_state_from_config_creates_data_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = ServerConfig {
            data_dir: dir.path().join("data"),
            backup_dir: dir.path().join("backups"),
            ..Default::default()
        };

        let state = AppState::from_config(&config).await.unwrap();
        assert!(state.datastore.data_dir().is_dir());
        assert_eq!(state.backups.backup_dir(), dir.path().join("backups"));
        assert_eq!(state.photos.dir(), Path::new("uploads"));
    }
}
