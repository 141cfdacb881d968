//! HTTP route handlers for the assistant API.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::AssistantError;
use crate::server::middleware::redact_body;
use crate::server::AppState;

// --- Request/Response types ---

#[derive(Deserialize)]
pub struct AskRequest {
    pub query: String,
}

#[derive(Serialize, Deserialize)]
pub struct AskResponse {
    pub reply: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub documents: usize,
    pub collection: String,
}

#[derive(Serialize)]
pub struct MetricsResponse {
    pub total_asks: u64,
    pub rejected: u64,
    pub out_of_scope: u64,
    pub no_match: u64,
    pub below_threshold: u64,
    pub answered: u64,
    pub avg_latency_us: f64,
    pub p50_latency_us: f64,
    pub p95_latency_us: f64,
    pub p99_latency_us: f64,
}

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(e: AssistantError) -> ApiError {
    let status = match &e {
        AssistantError::EmptyQuery => StatusCode::BAD_REQUEST,
        _ => {
            error!(error = %e, "ask failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

// --- Router ---

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ask", post(ask))
        .route("/health", get(health))
        .route("/metrics", get(get_metrics))
        .layer(axum::middleware::from_fn(redact_body))
        .with_state(state)
}

// --- Handlers ---

async fn ask(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let start = Instant::now();
    let result = state.assistant.answer(&req.query).await;
    let elapsed = start.elapsed();

    let answer = match result {
        Ok(answer) => answer,
        Err(e) => {
            if let Ok(mut metrics) = state.metrics.write() {
                metrics.record_rejected();
            }
            return Err(api_error(e));
        }
    };

    if let Ok(mut metrics) = state.metrics.write() {
        metrics.record_ask(answer.outcome, elapsed);
    }

    Ok(Json(AskResponse {
        reply: answer.reply,
    }))
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let index = state.assistant.index();
    Json(HealthResponse {
        status: "ok".to_string(),
        documents: index.len(),
        collection: index.collection_name(),
    })
}

async fn get_metrics(State(state): State<Arc<AppState>>) -> Result<Json<MetricsResponse>, ApiError> {
    let metrics = state.metrics.read().map_err(|_| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Lock poisoned".to_string(),
            }),
        )
    })?;

    Ok(Json(MetricsResponse {
        total_asks: metrics.total_asks(),
        rejected: metrics.rejected(),
        out_of_scope: metrics.out_of_scope(),
        no_match: metrics.no_match(),
        below_threshold: metrics.below_threshold(),
        answered: metrics.answered(),
        avg_latency_us: metrics.avg_latency_us(),
        p50_latency_us: metrics.percentile_latency_us(50.0),
        p95_latency_us: metrics.percentile_latency_us(95.0),
        p99_latency_us: metrics.percentile_latency_us(99.0),
    }))
}
