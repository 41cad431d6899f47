//! HTTP server bootstrap for the transparency ledger.
//!
//! Wires together:
//! - configuration from the environment
//! - the ledger engines and their persisted documents
//! - the Axum router with authentication middleware

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use crate::auth::{auth_middleware, AuthState, AuthStore, RegistrationGate, SlidingWindowLimiter};
use crate::infra::{AuditLog, MirrorSimulator, TransparencyLedger, ZkEngine};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server listen address.
    pub listen_addr: SocketAddr,
    /// Directory holding the persisted JSON documents.
    pub data_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let listen_addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .expect("Invalid listen address");

        let data_dir = std::env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));

        Self {
            listen_addr,
            data_dir,
        }
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub audit_log: Arc<AuditLog>,
    pub transparency: Arc<TransparencyLedger>,
    pub zk: Arc<ZkEngine>,
    pub mirrors: Arc<MirrorSimulator>,
    pub auth_store: Arc<AuthStore>,
    pub registration_gate: Arc<dyn RegistrationGate>,
}

/// Open every engine against its document under `data_dir`.
pub fn build_state(data_dir: &Path) -> AppState {
    let audit_log = Arc::new(AuditLog::open(data_dir.join("audit_log.json")));
    let transparency = Arc::new(TransparencyLedger::open(
        data_dir.join("transparency.json"),
        audit_log.clone(),
    ));
    let zk = Arc::new(ZkEngine::open(data_dir.join("zk_store.json")));
    let mirrors = Arc::new(MirrorSimulator::open(data_dir.join("mirror_store.json")));
    let auth_store = Arc::new(AuthStore::open(data_dir.join("auth.json")));
    let registration_gate: Arc<dyn RegistrationGate> =
        Arc::new(SlidingWindowLimiter::registration_default());

    AppState {
        audit_log,
        transparency,
        zk,
        mirrors,
        auth_store,
        registration_gate,
    }
}

/// Build the full router: routes, auth middleware, tracing, optional CORS.
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let auth_state = AuthState {
        store: state.auth_store.clone(),
    };

    let mut router = crate::api::router()
        .with_state(state)
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ))
        .layer(TraceLayer::new_for_http());

    if let Some(cors_layer) = cors_layer_from_env()? {
        router = router.layer(cors_layer);
    }

    Ok(router)
}

/// Start the HTTP server.
pub async fn run() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting transparency ledger v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env();
    info!("Configuration loaded");
    info!("  Listen address: {}", config.listen_addr);
    info!("  Data directory: {}", config.data_dir.display());

    let state = build_state(&config.data_dir);
    info!(
        events = state.audit_log.len(),
        parties = state.auth_store.list().len(),
        "engines initialized"
    );

    let app = build_router(state)?;

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!("Transparency ledger is ready to accept connections");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .init();
}

fn cors_layer_from_env() -> anyhow::Result<Option<CorsLayer>> {
    let origins = match std::env::var("CORS_ALLOW_ORIGINS") {
        Ok(v) => v,
        Err(_) => return Ok(None),
    };

    let origins = origins.trim();
    if origins.is_empty() {
        return Ok(None);
    }

    let allow_origin = if origins == "*" {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = origins
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin {s:?}: {e}"))
            })
            .collect::<anyhow::Result<_>>()?;
        AllowOrigin::list(origins)
    };

    Ok(Some(
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([Method::GET, Method::POST, Method::DELETE])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::HeaderName::from_static("x-api-key"),
            ]),
    ))
}
