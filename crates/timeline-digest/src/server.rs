//! HTTP trigger for digest runs.
//!
//! `GET /?secret=...` runs the pipeline once. Runs are serialized so two
//! triggers never race on the cursor.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::pipeline::Pipeline;

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<Pipeline>,
    secret: Arc<str>,
    run_lock: Arc<Mutex<()>>,
}

impl AppState {
    #[must_use]
    pub fn new(pipeline: Pipeline, secret: impl Into<Arc<str>>) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            secret: secret.into(),
            run_lock: Arc::new(Mutex::new(())),
        }
    }

    fn authorized(&self, candidate: Option<&str>) -> bool {
        candidate.is_some_and(|c| c.as_bytes().ct_eq(self.secret.as_bytes()).into())
    }
}

#[derive(Debug, Deserialize)]
struct TriggerParams {
    secret: Option<String>,
}

/// Build the HTTP router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(trigger_handler))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn run_server(state: AppState, addr: &str) -> std::io::Result<()> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Timeline digest trigger listening on {addr}");

    axum::serve(listener, app).await
}

async fn trigger_handler(
    State(state): State<AppState>,
    Query(params): Query<TriggerParams>,
) -> (StatusCode, String) {
    if !state.authorized(params.secret.as_deref()) {
        warn!("Rejected trigger with bad secret");
        return (StatusCode::UNAUTHORIZED, "Unauthorized".to_string());
    }

    let _guard = state.run_lock.lock().await;
    match state.pipeline.run_once().await {
        Ok(report) => {
            info!(status = %report.status, posts = report.posts, "Triggered run finished");
            (StatusCode::OK, "email sent!".to_string())
        }
        Err(e) => {
            error!(error = %e, "Triggered run failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}
