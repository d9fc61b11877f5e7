use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{Duration, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};

use super::round3;
use crate::error::AppError;
use crate::relay::SUPPORTED_METHODS;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub success: bool,
    pub total_requests: i64,
    pub recent_requests_24h: i64,
    pub methods: Map<String, Value>,
    pub avg_response_time: f64,
    pub health_status: &'static str,
    pub version: &'static str,
    pub timestamp: String,
}

/// Aggregate usage statistics.
///
/// A failing store probe only degrades `health_status`; any other failure is
/// reported as `{success: false, error}` with a 500.
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Response {
    match build_stats(&state) {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "error": err.to_string() })),
        )
            .into_response(),
    }
}

fn build_stats(state: &AppState) -> Result<StatsResponse, AppError> {
    let total_requests = state.store.count_all()?;

    let mut methods = Map::new();
    for method in SUPPORTED_METHODS {
        methods.insert(
            method.to_string(),
            state.store.count_by_method(method)?.into(),
        );
    }

    let yesterday = Utc::now() - Duration::hours(24);
    let recent_requests_24h = state.store.count_since(yesterday.timestamp())?;

    let avg_response_time = state
        .store
        .average_response_time()?
        .map(round3)
        .unwrap_or(0.0);

    let health_status = match state.store.ping() {
        Ok(()) => "healthy",
        Err(_) => "unhealthy",
    };

    Ok(StatsResponse {
        success: true,
        total_requests,
        recent_requests_24h,
        methods,
        avg_response_time,
        health_status,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now().to_rfc3339(),
    })
}
