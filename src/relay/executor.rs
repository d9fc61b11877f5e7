//! Outbound request execution.
//!
//! Dispatches a prepared request through reqwest with a fixed timeout,
//! optional proxy routing and wall-clock timing. Any received response is a
//! success, whatever its status code; only transport-level failures map to
//! errors. Persistence is the caller's responsibility.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Proxy};

use super::types::{Payload, PreparedRequest, RelayOutcome};
use crate::error::AppError;

/// Fixed timeout applied to every relayed call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Execute a prepared request and produce a structured outcome.
pub async fn execute(request: &PreparedRequest) -> Result<RelayOutcome, AppError> {
    let client = build_client(request.proxy.as_deref())?;

    let mut builder = client
        .request(request.method.clone(), &request.url)
        .headers(build_header_map(&request.headers));

    if let Some(body) = &request.body {
        builder = match body {
            Payload::Structured(value) => builder.json(value),
            Payload::Raw(text) => builder.body(text.clone()),
        };
    }

    let start = Instant::now();
    let response = builder.send().await?;

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
        .collect();
    let text = response.text().await?;
    let elapsed = start.elapsed().as_secs_f64();

    Ok(RelayOutcome {
        status,
        headers,
        body: Payload::from_text(text),
        elapsed,
    })
}

/// Build a client with the fixed timeout, routing through the proxy for both
/// http and https traffic when one is configured.
fn build_client(proxy: Option<&str>) -> Result<Client, AppError> {
    let mut builder = Client::builder().timeout(REQUEST_TIMEOUT);

    if let Some(proxy_url) = proxy {
        let proxy = Proxy::all(proxy_url)
            .map_err(|e| AppError::InvalidInput(format!("invalid proxy configuration: {}", e)))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| AppError::Internal(format!("failed to build HTTP client: {}", e)))
}

/// Convert the normalized header mapping into a reqwest header map, skipping
/// entries that are not valid HTTP header names or values.
fn build_header_map(headers: &HashMap<String, String>) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (key, value) in headers {
        if let (Ok(name), Ok(value)) = (HeaderName::from_str(key), HeaderValue::from_str(value)) {
            map.insert(name, value);
        }
    }
    map
}
