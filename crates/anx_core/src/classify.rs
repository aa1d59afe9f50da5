//! Turns error responses into typed [`ApiError`]s.
//!
//! The service reports failures two ways: through the HTTP status code, and
//! through `error_id`/`error_code` fields nested under `response` in the JSON
//! body. Some failures (`SYSTEM`/`SERVICE_UNAVAILABLE`, `SYSTEM`/`UNKNOWN`)
//! arrive with a 200 status, so both channels are consulted.

use crate::{RequestOptions, Response};
use anx_error::{AnxError, ApiError, ApiErrorKind};
use serde_json::Value;
use tracing::debug;

/// Header carrying the server's retry hint, in seconds.
pub const RETRY_AFTER_HEADER: &str = "retry-after";

/// Error fields extracted from a response body.
#[derive(Debug, Default)]
struct ErrorFields {
    id: Option<String>,
    code: Option<String>,
    message: Option<String>,
    description: Option<String>,
}

impl ErrorFields {
    fn from_body(body: &Value) -> Self {
        let inner = body.get("response").unwrap_or(body);
        let text = |key: &str| inner.get(key).and_then(Value::as_str).map(str::to_string);

        if inner.get("error_id").is_some() {
            Self {
                id: text("error_id"),
                code: text("error_code"),
                message: text("error"),
                description: text("error_description"),
            }
        } else if inner.get("id").is_some() {
            Self {
                id: text("id"),
                code: text("code"),
                message: text("message"),
                description: text("description"),
            }
        } else {
            Self::default()
        }
    }

    fn is_system(&self, code: &str) -> bool {
        self.id.as_deref() == Some("SYSTEM") && self.code.as_deref() == Some(code)
    }
}

/// Choose the error kind for a response, giving auth failures precedence.
/// Whole seconds at the start of a `retry-after` value, so `"1.5"` reads as 1.
fn parse_retry_after(value: &str) -> Option<u64> {
    let value = value.trim();
    let end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    value[..end].parse().ok()
}

fn kind_for(status_code: u16, fields: &ErrorFields, response: &Response) -> ApiErrorKind {
    let id = fields.id.as_deref();
    if status_code == 401 || id == Some("NOAUTH") {
        ApiErrorKind::NotAuthenticated
    } else if status_code == 403 || id == Some("UNAUTH") {
        ApiErrorKind::NotAuthorized
    } else if fields.is_system("SERVICE_UNAVAILABLE") {
        ApiErrorKind::ServiceUnavailable
    } else if status_code == 405 || status_code == 429 || fields.is_system("RATE_EXCEEDED") {
        // 405 is the legacy rate limit status
        ApiErrorKind::RateLimitExceeded {
            retry_after: response.header(RETRY_AFTER_HEADER).and_then(parse_retry_after),
        }
    } else if fields.is_system("UNKNOWN") {
        ApiErrorKind::SystemUnknown
    } else {
        ApiErrorKind::Api
    }
}

/// Build a typed error from a response the caller already knows is a failure.
///
/// # Examples
///
/// ```
/// use anx_core::{build_error, RequestOptions, Response};
/// use serde_json::json;
///
/// let response = Response::new(429, json!({})).with_header("retry-after", "2");
/// let err = build_error(&RequestOptions::from("/limit"), &response);
/// assert!(err.is_rate_limit());
/// assert_eq!(err.retry_after(), Some(2));
/// ```
pub fn build_error(request: &RequestOptions, response: &Response) -> AnxError {
    let fields = ErrorFields::from_body(&response.body);
    let kind = kind_for(response.status_code, &fields, response);
    debug!(
        method = %request.method,
        uri = %request.uri,
        status = response.status_code,
        kind = %kind,
        "Classified error response"
    );

    let mut err = ApiError::new(kind)
        .with_ids(fields.id, fields.code)
        .with_description(fields.description);
    if response.status_code > 0 {
        err = err.with_status(response.status_code);
    }
    if let Some(message) = fields.message {
        err = err.with_message(message);
    }
    err.into()
}

/// Classify a response, returning an error if it represents a failure.
///
/// Statuses of 400 and above are failures, as are otherwise successful bodies
/// reporting `SYSTEM`/`SERVICE_UNAVAILABLE` or `SYSTEM`/`UNKNOWN`.
pub fn classify_response(request: &RequestOptions, response: &Response) -> Option<AnxError> {
    if response.status_code >= 400 {
        return Some(build_error(request, response));
    }
    let fields = ErrorFields::from_body(&response.body);
    if fields.is_system("SERVICE_UNAVAILABLE") || fields.is_system("UNKNOWN") {
        return Some(build_error(request, response));
    }
    None
}
