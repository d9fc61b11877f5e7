use std::collections::HashMap;

use chrono::{TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;

/// A persisted API call, one row of the `api_calls` table.
#[derive(Debug, Clone)]
pub struct ApiCallRecord {
    pub id: i64,
    pub url: String,
    pub method: String,
    /// JSON-serialized header mapping, `None` when the request had none.
    pub headers: Option<String>,
    pub body: Option<String>,
    pub proxy: Option<String>,
    pub response_status: Option<u16>,
    /// Response payload as stored text; compact JSON for structured payloads.
    pub response_data: Option<String>,
    /// Elapsed seconds for the outbound call.
    pub response_time: Option<f64>,
    /// UTC unix seconds, assigned by the store on insert.
    pub timestamp: i64,
}

/// Fields supplied by the caller on insert; id and timestamp are assigned by
/// the store.
#[derive(Debug, Clone, Default)]
pub struct NewApiCall {
    pub url: String,
    pub method: String,
    pub headers: Option<String>,
    pub body: Option<String>,
    pub proxy: Option<String>,
    pub response_status: Option<u16>,
    pub response_data: Option<String>,
    pub response_time: Option<f64>,
}

/// JSON view of a record as returned by the history endpoints.
#[derive(Debug, Serialize)]
pub struct ApiCallView {
    pub id: i64,
    pub url: String,
    pub method: String,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
    pub proxy: Option<String>,
    pub response_status: Option<u16>,
    pub response_data: Option<Value>,
    pub response_time: Option<f64>,
    pub timestamp: String,
}

impl ApiCallRecord {
    /// Deserialize the stored text columns back into structured form.
    ///
    /// Headers that fail to parse degrade to an empty mapping; a response
    /// payload that is not JSON comes back as the raw string.
    pub fn into_view(self) -> ApiCallView {
        let headers = self
            .headers
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default();
        let response_data = self.response_data.map(|raw| match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(_) => Value::String(raw),
        });

        ApiCallView {
            id: self.id,
            url: self.url,
            method: self.method,
            headers,
            body: self.body,
            proxy: self.proxy,
            response_status: self.response_status,
            response_data,
            response_time: self.response_time,
            timestamp: format_timestamp(self.timestamp),
        }
    }
}

/// Format unix seconds as `YYYY-MM-DD HH:MM:SS` (UTC).
fn format_timestamp(unix_seconds: i64) -> String {
    Utc.timestamp_opt(unix_seconds, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> ApiCallRecord {
        ApiCallRecord {
            id: 7,
            url: "https://example.com/api".to_string(),
            method: "POST".to_string(),
            headers: Some(r#"{"accept":"application/json"}"#.to_string()),
            body: Some(r#"{"name":"alice"}"#.to_string()),
            proxy: None,
            response_status: Some(201),
            response_data: Some(r#"{"id":1}"#.to_string()),
            response_time: Some(0.125),
            timestamp: 0,
        }
    }

    #[test]
    fn view_deserializes_stored_columns() {
        let view = record().into_view();
        assert_eq!(view.headers.get("accept").unwrap(), "application/json");
        assert_eq!(view.response_data, Some(json!({ "id": 1 })));
        assert_eq!(view.timestamp, "1970-01-01 00:00:00");
    }

    #[test]
    fn raw_response_data_comes_back_as_string() {
        let mut record = record();
        record.response_data = Some("<html>oops</html>".to_string());
        let view = record.into_view();
        assert_eq!(
            view.response_data,
            Some(Value::String("<html>oops</html>".to_string()))
        );
    }

    #[test]
    fn missing_columns_stay_empty() {
        let record = ApiCallRecord {
            id: 1,
            url: "https://example.com".to_string(),
            method: "GET".to_string(),
            headers: None,
            body: None,
            proxy: None,
            response_status: None,
            response_data: None,
            response_time: None,
            timestamp: 0,
        };
        let view = record.into_view();
        assert!(view.headers.is_empty());
        assert_eq!(view.response_data, None);
    }
}
