use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use super::round3;
use crate::error::AppError;
use crate::relay::{self, Payload, PreparedRequest, RelayRequest};
use crate::store::NewApiCall;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct CallResponse {
    pub success: bool,
    pub status_code: u16,
    pub response_data: Payload,
    pub response_time: f64,
    pub headers: HashMap<String, String>,
    pub request_id: i64,
}

/// Relay an API call and persist the request/response pair.
///
/// A record is written only once a response exists; transport-level failures
/// surface as errors without touching the store.
pub async fn call_api(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RelayRequest>,
) -> Result<Json<CallResponse>, AppError> {
    tracing::debug!(method = %request.method, url = %request.url, "Relaying request");

    let prepared = PreparedRequest::from_relay(request)?;
    let outcome = match relay::execute(&prepared).await {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::warn!(error = %err, url = %prepared.url, "Relay failed");
            return Err(err);
        }
    };

    let record = NewApiCall {
        url: prepared.url.clone(),
        method: prepared.method.to_string(),
        headers: if prepared.headers.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&prepared.headers)?)
        },
        body: prepared.body.as_ref().map(Payload::to_stored_text),
        proxy: prepared.proxy.clone(),
        response_status: Some(outcome.status),
        response_data: Some(outcome.body.to_stored_text()),
        response_time: Some(outcome.elapsed),
    };
    let request_id = state.store.insert(record)?;

    tracing::debug!(status = outcome.status, request_id, "Request persisted");

    Ok(Json(CallResponse {
        success: true,
        status_code: outcome.status,
        response_data: outcome.body,
        response_time: round3(outcome.elapsed),
        headers: outcome.headers,
        request_id,
    }))
}
