//! HTTP-facing entry points.

pub mod call;
pub mod health;
pub mod history;
pub mod stats;
pub mod static_files;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use crate::AppState;

/// Assemble the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/call", axum::routing::post(call::call_api))
        .route("/api/history", get(history::get_history))
        .route(
            "/api/history/:id",
            get(history::get_request_detail).delete(history::delete_request),
        )
        .route("/api/stats", get(stats::get_stats))
        .fallback(static_files::serve_static)
        .with_state(state)
}

/// Round to three decimals for response payloads.
pub(crate) fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
