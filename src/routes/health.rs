use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::json;

use crate::AppState;

/// Liveness probe for the service and its storage dependency.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Response {
    let database = match state.store.ping() {
        Ok(()) => "healthy".to_string(),
        Err(err) => format!("unhealthy: {}", err),
    };
    let healthy = database == "healthy";

    let body = json!({
        "status": if healthy { "healthy" } else { "degraded" },
        "timestamp": Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "database": database,
            "api": "healthy",
        },
    });

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(body)).into_response()
}
