use std::collections::HashMap;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;

/// Methods accepted by the relay, in the order the stats endpoint reports.
pub const SUPPORTED_METHODS: [&str; 5] = ["GET", "POST", "PUT", "DELETE", "PATCH"];

/// Incoming relay request from the frontend.
///
/// `url` defaults to empty so a missing field reaches validation instead of
/// failing deserialization.
#[derive(Debug, Deserialize)]
pub struct RelayRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_method")]
    pub method: String,
    /// Either a mapping or a JSON-encoded string of one.
    #[serde(default)]
    pub headers: Value,
    pub body: Option<Value>,
    pub proxy: Option<String>,
}

fn default_method() -> String {
    "GET".to_string()
}

/// A request or response payload, resolved once at the boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Structured(Value),
    Raw(String),
}

impl Payload {
    /// Resolve a submitted body: strings get one JSON parse attempt and pass
    /// through raw on failure, other values are already structured.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(raw) => match serde_json::from_str(&raw) {
                Ok(parsed) => Payload::Structured(parsed),
                Err(_) => Payload::Raw(raw),
            },
            other => Payload::Structured(other),
        }
    }

    /// Decode a response body, keeping the raw text when it is not JSON.
    pub fn from_text(text: String) -> Self {
        match serde_json::from_str(&text) {
            Ok(parsed) => Payload::Structured(parsed),
            Err(_) => Payload::Raw(text),
        }
    }

    /// Text form persisted in the record store.
    pub fn to_stored_text(&self) -> String {
        match self {
            Payload::Structured(value) => value.to_string(),
            Payload::Raw(text) => text.clone(),
        }
    }
}

/// Result of a relayed call that received a response, whatever the status.
#[derive(Debug)]
pub struct RelayOutcome {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Payload,
    /// Wall-clock seconds from dispatch to full body download.
    pub elapsed: f64,
}

/// A validated, normalized request ready for dispatch.
///
/// Construction performs all input validation, so no network I/O ever
/// happens for a malformed submission.
#[derive(Debug)]
pub struct PreparedRequest {
    pub url: String,
    pub method: Method,
    pub headers: HashMap<String, String>,
    pub body: Option<Payload>,
    pub proxy: Option<String>,
}

impl PreparedRequest {
    pub fn from_relay(request: RelayRequest) -> Result<Self, AppError> {
        let url = request.url.trim().to_string();
        if url.is_empty() {
            return Err(AppError::InvalidInput("missing URL".to_string()));
        }

        let proxy = request
            .proxy
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);
        if let Some(proxy_url) = proxy.as_deref() {
            if !proxy_url.starts_with("http://")
                && !proxy_url.starts_with("https://")
                && !proxy_url.starts_with("socks5://")
            {
                return Err(AppError::InvalidInput(
                    "proxy must start with http://, https:// or socks5://".to_string(),
                ));
            }
        }

        let method = parse_method(&request.method)?;

        // A body is only meaningful for methods that carry one.
        let body = if accepts_body(&method) {
            request
                .body
                .filter(|value| !value.is_null())
                .map(Payload::from_value)
        } else {
            None
        };

        Ok(Self {
            url,
            method,
            headers: normalize_headers(&request.headers),
            body,
            proxy,
        })
    }
}

fn accepts_body(method: &Method) -> bool {
    matches!(method.as_str(), "POST" | "PUT" | "PATCH")
}

fn parse_method(raw: &str) -> Result<Method, AppError> {
    match raw.trim().to_uppercase().as_str() {
        "GET" => Ok(Method::GET),
        "POST" => Ok(Method::POST),
        "PUT" => Ok(Method::PUT),
        "DELETE" => Ok(Method::DELETE),
        "PATCH" => Ok(Method::PATCH),
        other => Err(AppError::InvalidInput(format!(
            "unsupported method: {}",
            other
        ))),
    }
}

/// Accepts either a JSON object or a JSON-encoded string of one; anything
/// else, including a string that fails to parse, degrades to no headers.
fn normalize_headers(value: &Value) -> HashMap<String, String> {
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(name, value)| {
                let text = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (name.clone(), text)
            })
            .collect(),
        Value::String(raw) => serde_json::from_str(raw).unwrap_or_default(),
        _ => HashMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn relay_request(value: Value) -> RelayRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn missing_url_is_rejected() {
        let request = relay_request(json!({ "method": "GET" }));
        let err = PreparedRequest::from_relay(request).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn blank_url_is_rejected() {
        let request = relay_request(json!({ "url": "   " }));
        assert!(PreparedRequest::from_relay(request).is_err());
    }

    #[test]
    fn method_defaults_to_get_and_is_case_insensitive() {
        let request = relay_request(json!({ "url": "https://example.com" }));
        let prepared = PreparedRequest::from_relay(request).unwrap();
        assert_eq!(prepared.method, Method::GET);

        let request = relay_request(json!({ "url": "https://example.com", "method": "patch" }));
        let prepared = PreparedRequest::from_relay(request).unwrap();
        assert_eq!(prepared.method, Method::PATCH);
    }

    #[test]
    fn unsupported_method_is_rejected() {
        let request = relay_request(json!({ "url": "https://example.com", "method": "TRACE" }));
        let err = PreparedRequest::from_relay(request).unwrap_err();
        assert!(err.to_string().contains("unsupported method"));
    }

    #[test]
    fn proxy_scheme_is_validated() {
        for proxy in ["http://p:8080", "https://p:8080", "socks5://p:1080"] {
            let request =
                relay_request(json!({ "url": "https://example.com", "proxy": proxy }));
            let prepared = PreparedRequest::from_relay(request).unwrap();
            assert_eq!(prepared.proxy.as_deref(), Some(proxy));
        }

        let request =
            relay_request(json!({ "url": "https://example.com", "proxy": "ftp://p:21" }));
        assert!(PreparedRequest::from_relay(request).is_err());
    }

    #[test]
    fn blank_proxy_is_ignored() {
        let request = relay_request(json!({ "url": "https://example.com", "proxy": "  " }));
        let prepared = PreparedRequest::from_relay(request).unwrap();
        assert!(prepared.proxy.is_none());
    }

    #[test]
    fn body_is_dropped_for_get() {
        let request = relay_request(json!({
            "url": "https://example.com",
            "method": "GET",
            "body": { "ignored": true },
        }));
        let prepared = PreparedRequest::from_relay(request).unwrap();
        assert!(prepared.body.is_none());
    }

    #[test]
    fn string_body_is_parsed_once() {
        let request = relay_request(json!({
            "url": "https://example.com",
            "method": "POST",
            "body": r#"{"name":"alice"}"#,
        }));
        let prepared = PreparedRequest::from_relay(request).unwrap();
        assert_eq!(
            prepared.body,
            Some(Payload::Structured(json!({ "name": "alice" })))
        );
    }

    #[test]
    fn unparseable_string_body_passes_through_raw() {
        let request = relay_request(json!({
            "url": "https://example.com",
            "method": "POST",
            "body": "plain text",
        }));
        let prepared = PreparedRequest::from_relay(request).unwrap();
        assert_eq!(prepared.body, Some(Payload::Raw("plain text".to_string())));
    }

    #[test]
    fn headers_accept_mapping_and_encoded_string() {
        let request = relay_request(json!({
            "url": "https://example.com",
            "headers": { "x-api-key": "secret", "x-retry": 3 },
        }));
        let prepared = PreparedRequest::from_relay(request).unwrap();
        assert_eq!(prepared.headers.get("x-api-key").unwrap(), "secret");
        assert_eq!(prepared.headers.get("x-retry").unwrap(), "3");

        let request = relay_request(json!({
            "url": "https://example.com",
            "headers": r#"{"x-api-key":"secret"}"#,
        }));
        let prepared = PreparedRequest::from_relay(request).unwrap();
        assert_eq!(prepared.headers.get("x-api-key").unwrap(), "secret");
    }

    #[test]
    fn unparseable_header_string_degrades_to_empty() {
        let request = relay_request(json!({
            "url": "https://example.com",
            "headers": "not json",
        }));
        let prepared = PreparedRequest::from_relay(request).unwrap();
        assert!(prepared.headers.is_empty());
    }

    #[test]
    fn response_text_decodes_to_structured_or_raw() {
        assert_eq!(
            Payload::from_text(r#"{"ok":true}"#.to_string()),
            Payload::Structured(json!({ "ok": true }))
        );
        assert_eq!(
            Payload::from_text("<html></html>".to_string()),
            Payload::Raw("<html></html>".to_string())
        );
    }

    #[test]
    fn stored_text_round_trips() {
        let structured = Payload::Structured(json!({ "a": 1 }));
        assert_eq!(structured.to_stored_text(), r#"{"a":1}"#);

        let raw = Payload::Raw("hello".to_string());
        assert_eq!(raw.to_stored_text(), "hello");
    }
}
