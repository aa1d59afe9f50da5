//! Normalized response returned by every transport stage.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// A response from the remote API, independent of the HTTP library used.
///
/// The raw transport returns this for every status code. Turning error
/// statuses into errors is the classifier's job.
///
/// # Examples
///
/// ```
/// use anx_core::Response;
/// use serde_json::json;
///
/// let response = Response::new(200, json!({ "response": { "status": "OK" } }))
///     .with_header("X-RateLimit-Read", "100");
///
/// assert_eq!(response.header("x-ratelimit-read"), Some("100"));
/// assert!(response.is_success());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// URI the request was sent to
    pub uri: String,
    /// HTTP status code
    pub status_code: u16,
    /// Response headers as reported by the transport
    pub headers: BTreeMap<String, String>,
    /// Decoded JSON body (`Null` when empty or not JSON)
    pub body: serde_json::Value,
    /// Time spent in the transport
    pub request_time: Duration,
    /// Time from pipeline entry until the response was classified
    pub total_time: Duration,
}

impl Response {
    /// A response with the given status and body.
    pub fn new(status_code: u16, body: serde_json::Value) -> Self {
        Self {
            status_code,
            body,
            ..Default::default()
        }
    }

    /// Add a header, replacing any previous value.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Status code is below 400.
    pub fn is_success(&self) -> bool {
        self.status_code < 400
    }
}
