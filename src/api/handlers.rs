use crate::api::AppState;
use crate::error::Result;
use crate::search::{ConsumerState, SearchResult};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use prometheus::Encoder;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Success envelope shared by every endpoint
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub code: u32,
    pub msg: &'static str,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            code: 0,
            msg: "OK",
            data,
        }
    }
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let consumer = state.consumer.as_ref().map(|rx| *rx.borrow());
    let ready = state.bootstrap.is_done() && consumer != Some(ConsumerState::Failed);

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if ready { "healthy" } else { "unavailable" },
            version: env!("CARGO_PKG_VERSION"),
            uptime_seconds: state.started_at.elapsed().as_secs(),
            indexes_ready: state.bootstrap.is_done(),
            consumer,
        }),
    )
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub indexes_ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumer: Option<ConsumerState>,
}

/// Federated search over every kind
pub async fn search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<ApiResponse<SearchResult>>> {
    request.validate()?;

    let result = state
        .search
        .search(&request.keywords, request.offset, request.limit)
        .await?;

    Ok(Json(ApiResponse::ok(result)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SearchRequest {
    #[serde(default)]
    pub keywords: String,
    #[serde(default)]
    #[validate(range(max = 9_900))]
    pub offset: usize,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: usize,
}

fn default_limit() -> usize {
    20
}

/// Prometheus text exposition of the default registry
pub async fn metrics() -> impl IntoResponse {
    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain")],
            String::from("# Error encoding metrics\n"),
        );
    }

    let body = String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to convert metrics to string");
        String::from("# Error converting metrics\n")
    });

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
}
