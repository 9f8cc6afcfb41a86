//! HTTP shell for the analysis pipeline.
//!
//! # Endpoints
//!
//! - `GET /health` - store and reasoning service reachability
//! - `GET /api/graph` - the kill-chain stage graph (structured and DOT)
//! - `POST /api/analyze` - `{"query": "..."}` → analysis report
//!
//! The pipeline is blocking and assumes one query at a time, so analyses are
//! serialised behind a mutex and run on the blocking pool.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::{
    app::AppContext,
    application::{AnalysisReport, AnalyzeRequest, GraphResponse, HealthStatusResponse},
    domain::DomainError,
    infrastructure::DotRenderer,
};

pub const DEFAULT_PORT: u16 = 3300;

#[derive(Clone)]
pub struct HttpState {
    context: Arc<AppContext>,
    in_flight: Arc<Mutex<()>>,
}

impl HttpState {
    pub fn new(context: Arc<AppContext>) -> Self {
        Self {
            context,
            in_flight: Arc::new(Mutex::new(())),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(err: &DomainError) -> ApiError {
    let status = match err {
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::RetrievalUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        DomainError::ReasoningFailure(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            code: err.code().to_string(),
        }),
    )
}

fn join_error(err: tokio::task::JoinError) -> ApiError {
    error_response(&DomainError::other(format!("worker task failed: {err}")))
}

async fn health_check(
    State(state): State<HttpState>,
) -> (StatusCode, Json<HealthStatusResponse>) {
    let context = Arc::clone(&state.context);
    match tokio::task::spawn_blocking(move || context.health()).await {
        Ok(health) if health.ok => (StatusCode::OK, Json(health)),
        Ok(health) => (StatusCode::SERVICE_UNAVAILABLE, Json(health)),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(HealthStatusResponse {
                ok: false,
                message: "health check failed".into(),
                details: Some(err.to_string()),
            }),
        ),
    }
}

async fn stage_graph(State(state): State<HttpState>) -> Json<GraphResponse> {
    let graph = state.context.graph();
    let dot = DotRenderer::to_dot(&graph);
    Json(GraphResponse { graph, dot })
}

async fn analyze(
    State(state): State<HttpState>,
    Json(payload): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisReport>, ApiError> {
    // held by the blocking task: a dropped request still blocks the next one
    let in_flight = Arc::clone(&state.in_flight).lock_owned().await;
    let context = Arc::clone(&state.context);

    let result = tokio::task::spawn_blocking(move || {
        let _in_flight = in_flight;
        context.analyze(&payload.query)
    })
    .await
    .map_err(join_error)?;

    match result {
        Ok(report) => {
            info!(
                target: "killchain::http",
                elapsed_ms = report.elapsed_ms,
                well_formed = report.breakdown.is_well_formed(),
                "analysis served"
            );
            Ok(Json(report))
        }
        Err(err) => {
            error!(target: "killchain::http", error = %err, "analysis failed");
            Err(error_response(&err))
        }
    }
}

pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/graph", get(stage_graph))
        .route("/api/analyze", post(analyze))
        .with_state(state)
}

fn bind_addr() -> Result<SocketAddr> {
    let host = std::env::var("KILLCHAIN_SERVICE_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("KILLCHAIN_SERVICE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("invalid bind address {host}:{port}"))
}

pub async fn run_http_service() -> Result<()> {
    crate::init_tracing();
    info!(target: "killchain::http", "starting killchain service v{}", env!("CARGO_PKG_VERSION"));

    let context = tokio::task::spawn_blocking(crate::build_environment)
        .await
        .context("initialisation task panicked")??;
    info!(target: "killchain::http", data_dir = %context.data_dir().display(), "environment ready");

    let app = router(HttpState::new(Arc::new(context)));
    let addr = bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(target: "killchain::http", "listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("server failed")?;

    Ok(())
}
