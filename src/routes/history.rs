use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::store::{ApiCallRecord, ApiCallView};
use crate::AppState;

/// Default number of records returned by the history listing.
const DEFAULT_LIMIT: u32 = 50;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub requests: Vec<ApiCallView>,
}

#[derive(Debug, Serialize)]
pub struct RecordResponse {
    pub success: bool,
    pub request: ApiCallView,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, AppError> {
    let requests = state
        .store
        .list(query.limit.unwrap_or(DEFAULT_LIMIT))?
        .into_iter()
        .map(ApiCallRecord::into_view)
        .collect();

    Ok(Json(HistoryResponse {
        success: true,
        requests,
    }))
}

pub async fn get_request_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<RecordResponse>, AppError> {
    match state.store.get(id)? {
        Some(record) => Ok(Json(RecordResponse {
            success: true,
            request: record.into_view(),
        })),
        None => Err(AppError::NotFound("request not found".to_string())),
    }
}

pub async fn delete_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteResponse>, AppError> {
    if !state.store.delete(id)? {
        return Err(AppError::NotFound("request not found".to_string()));
    }

    tracing::debug!(id, "History record deleted");

    Ok(Json(DeleteResponse {
        success: true,
        message: "request deleted".to_string(),
    }))
}
