//! Axum server setup
//!
//! Server skeleton with:
//! - CORS with credentials for configured origins
//! - Tracing middleware
//! - Optional static SPA hosting
//! - Periodic purge of expired sessions
//! - Graceful shutdown on SIGTERM/Ctrl+C

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderValue, Method, Uri};
use axum::Router;
use numtree_core::NumtreeConfig;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use super::error::ApiError;
use super::routes;
use crate::auth::SessionSettings;
use crate::db::SessionRepo;

/// How often expired sessions are deleted
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:8080)
    pub bind_addr: SocketAddr,

    /// Mirror any origin with credentials (default: false)
    ///
    /// WARNING: only for development.
    pub cors_permissive: bool,

    /// Origins allowed to make credentialed requests
    pub allowed_origins: Vec<String>,

    /// Built client bundle served for every non-API path
    pub static_dir: Option<PathBuf>,

    pub session: SessionSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_config(&NumtreeConfig::default())
    }
}

impl ServerConfig {
    /// Build from the resolved file/env configuration.
    pub fn from_config(config: &NumtreeConfig) -> Self {
        Self {
            bind_addr: config.server.bind,
            cors_permissive: config.server.cors_permissive,
            allowed_origins: config.server.allowed_origins.clone(),
            static_dir: config.server.static_dir.clone(),
            session: SessionSettings {
                ttl_hours: config.auth.session_ttl_hours,
                secure_cookies: config.auth.secure_cookies,
            },
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub session: SessionSettings,
}

fn cors_layer(config: &ServerConfig) -> Result<CorsLayer, ServerError> {
    if config.cors_permissive {
        tracing::warn!("CORS: Permissive mode enabled - all origins allowed");
        return Ok(CorsLayer::very_permissive());
    }

    let origins = config
        .allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|_| ServerError::Config(format!("invalid CORS origin: {}", origin)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true))
}

/// Unknown `/api/*` paths
async fn api_not_found(uri: Uri) -> ApiError {
    ApiError::NotFound {
        resource: "Route",
        id: uri.path().to_owned(),
    }
}

/// Build the application router.
///
/// API routes live under `/api`; everything else is served from
/// `static_dir` (falling back to its `index.html`) when one is configured.
pub fn build_router(state: AppState, config: &ServerConfig) -> Result<Router, ServerError> {
    let cors = cors_layer(config)?;

    let api = Router::new()
        .merge(routes::health::router())
        .merge(routes::auth::router())
        .merge(routes::posts::router())
        .fallback(api_not_found);

    let mut app = Router::new().nest("/api", api);

    if let Some(dir) = &config.static_dir {
        tracing::info!(dir = %dir.display(), "Serving static files");
        let index = ServeFile::new(dir.join("index.html"));
        app = app.fallback_service(ServeDir::new(dir).fallback(index));
    }

    Ok(app
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state)))
}

/// Run the HTTP server.
///
/// # Example
///
/// ```ignore
/// let pool = create_pool(&database_url).await?;
/// let config = ServerConfig::default();
/// run_server(pool, config).await?;
/// ```
pub async fn run_server(pool: PgPool, config: ServerConfig) -> Result<(), ServerError> {
    let state = AppState {
        pool: pool.clone(),
        session: config.session,
    };
    let app = build_router(state, &config)?;

    let purge = tokio::spawn(purge_sessions(pool));

    // Bind listener
    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    // Run with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    purge.abort();
    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn purge_sessions(pool: PgPool) {
    let mut ticker = tokio::time::interval(SESSION_PURGE_INTERVAL);
    loop {
        ticker.tick().await;
        match SessionRepo::new(&pool).purge_expired().await {
            Ok(0) => {}
            Ok(removed) => tracing::info!(removed, "Purged expired sessions"),
            Err(e) => tracing::warn!(error = %e, "Session purge failed"),
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}
