//! Errors reported by the remote API.

/// Classification of an error response from the remote API.
///
/// Produced once by the response classifier and consumed as a plain tag by
/// the admission queues.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ApiErrorKind {
    /// Credentials were missing or rejected (401, `NOAUTH`)
    #[display("Authentication failed")]
    NotAuthenticated,
    /// Credentials were valid but lack permission (403, `UNAUTH`)
    #[display("Authorization failed")]
    NotAuthorized,
    /// The service rejected the request for exceeding its rate limit
    #[display("Rate Limit Exceeded")]
    RateLimitExceeded {
        /// Seconds the server asked us to wait, from the `retry-after` header
        retry_after: Option<u64>,
    },
    /// `SYSTEM` / `SERVICE_UNAVAILABLE`
    #[display("Service Unavailable")]
    ServiceUnavailable,
    /// `SYSTEM` / `UNKNOWN`
    #[display("Unknown")]
    SystemUnknown,
    /// Any other error response
    #[display("API request failed")]
    Api,
}

/// Error response from the remote API with source location.
///
/// # Examples
///
/// ```
/// use anx_error::{ApiError, ApiErrorKind};
///
/// let err = ApiError::new(ApiErrorKind::RateLimitExceeded { retry_after: Some(3) })
///     .with_status(429);
/// assert_eq!(err.status_code, Some(429));
/// assert_eq!(err.message, "Rate Limit Exceeded");
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("API Error: {} ({}) at line {} in {}", kind, message, line, file)]
pub struct ApiError {
    /// Classification of the failure
    pub kind: ApiErrorKind,
    /// HTTP status code of the response, if any
    pub status_code: Option<u16>,
    /// `error_id` from the response body
    pub error_id: Option<String>,
    /// `error_code` from the response body
    pub error_code: Option<String>,
    /// Human readable message; defaults to the kind's description
    pub message: String,
    /// `error_description` from the response body
    pub description: Option<String>,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ApiError {
    /// Create a new ApiError of the given kind at the current location.
    #[track_caller]
    pub fn new(kind: ApiErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: kind.to_string(),
            kind,
            status_code: None,
            error_id: None,
            error_code: None,
            description: None,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Attach the HTTP status code.
    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    /// Attach the body's `error_id` and `error_code`.
    pub fn with_ids(mut self, error_id: Option<String>, error_code: Option<String>) -> Self {
        self.error_id = error_id;
        self.error_code = error_code;
        self
    }

    /// Replace the default message. Empty messages are ignored.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        if !message.is_empty() {
            self.message = message;
        }
        self
    }

    /// Attach the body's `error_description`.
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Retry hint in seconds, if this is a rate limit rejection that carried one.
    pub fn retry_after(&self) -> Option<u64> {
        match self.kind {
            ApiErrorKind::RateLimitExceeded { retry_after } => retry_after,
            _ => None,
        }
    }
}
