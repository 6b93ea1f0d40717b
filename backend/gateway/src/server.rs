//! HTTP server wiring.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use medassist_assistant::{InfoCollector, QueryAnswerer};
use medassist_extraction::FormExtractor;
use serde_json::Value;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::{info, instrument, warn};

use crate::handlers;
use crate::session_registry::SessionRegistry;

/// Largest accepted request body, uploads included.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Application state shared across routes.
#[derive(Clone)]
pub struct GatewayState {
    pub collector: Arc<InfoCollector>,
    pub answerer: Arc<QueryAnswerer>,
    /// `None` when no OCR service is configured.
    pub extractor: Option<Arc<FormExtractor>>,
    pub sessions: SessionRegistry,
    /// Directory searched for `<stem>_gt.json` files.
    pub ground_truth_dir: PathBuf,
    /// Overrides the language template for dynamic validation.
    pub reference_template: Option<Arc<Value>>,
    pub started_at: Instant,
}

impl GatewayState {
    pub fn new(
        collector: Arc<InfoCollector>,
        answerer: Arc<QueryAnswerer>,
        extractor: Option<Arc<FormExtractor>>,
        ground_truth_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            collector,
            answerer,
            extractor,
            sessions: SessionRegistry::new(),
            ground_truth_dir: ground_truth_dir.into(),
            reference_template: None,
            started_at: Instant::now(),
        }
    }

    pub fn with_reference_template(mut self, reference: Value) -> Self {
        self.reference_template = Some(Arc::new(reference));
        self
    }

    pub fn with_session_ttl(mut self, idle_ttl: Duration) -> Self {
        self.sessions = SessionRegistry::with_idle_ttl(idle_ttl);
        self
    }
}

pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/collect_user_info", post(handlers::collect_user_info))
        .route("/answer_query", post(handlers::answer_query))
        .route("/extract", post(handlers::extract))
        .route("/sessions/:id", delete(handlers::delete_session))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
#[instrument(skip(state))]
pub async fn start_server(addr: SocketAddr, state: GatewayState) -> Result<()> {
    let app = build_router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("Gateway HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
