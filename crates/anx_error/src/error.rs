//! Top-level error wrapper types.

use crate::{
    ApiError, ApiErrorKind, ConfigError, HttpError, JsonError, NetworkError, RateLimitError,
    RequestError,
};

/// Every error condition the anx crates can produce.
///
/// # Examples
///
/// ```
/// use anx_error::{AnxError, HttpError};
///
/// let http_err = HttpError::new("Connection failed");
/// let err: AnxError = http_err.into();
/// assert!(format!("{}", err).contains("HTTP Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum AnxErrorKind {
    /// Error response from the remote API
    #[from(ApiError)]
    Api(ApiError),
    /// Transport failure
    #[from(NetworkError)]
    Network(NetworkError),
    /// Invalid request options
    #[from(RequestError)]
    Request(RequestError),
    /// Admission layer failure
    #[from(RateLimitError)]
    RateLimit(RateLimitError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// HTTP client error
    #[from(HttpError)]
    Http(HttpError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
}

/// anx error with kind discrimination.
///
/// # Examples
///
/// ```
/// use anx_error::{AnxError, AnxResult, ApiError, ApiErrorKind};
///
/// let err: AnxError = ApiError::new(ApiErrorKind::RateLimitExceeded { retry_after: Some(1) }).into();
/// assert!(err.is_rate_limit());
/// assert_eq!(err.retry_after(), Some(1));
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("anx Error: {}", _0)]
pub struct AnxError(Box<AnxErrorKind>);

impl AnxError {
    /// Create a new error from a kind.
    pub fn new(kind: AnxErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &AnxErrorKind {
        &self.0
    }

    /// The API error, if this came from the remote service.
    pub fn as_api(&self) -> Option<&ApiError> {
        match self.kind() {
            AnxErrorKind::Api(err) => Some(err),
            _ => None,
        }
    }

    /// True if the service rejected the request for exceeding its rate limit.
    pub fn is_rate_limit(&self) -> bool {
        matches!(
            self.as_api().map(|err| &err.kind),
            Some(ApiErrorKind::RateLimitExceeded { .. })
        )
    }

    /// Server supplied retry hint in seconds for rate limit rejections.
    pub fn retry_after(&self) -> Option<u64> {
        self.as_api().and_then(ApiError::retry_after)
    }

    /// HTTP status code, when the error carries one.
    pub fn status_code(&self) -> Option<u16> {
        self.as_api().and_then(|err| err.status_code)
    }
}

// Generic From implementation for any type that converts to AnxErrorKind
impl<T> From<T> for AnxError
where
    T: Into<AnxErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for anx operations.
///
/// # Examples
///
/// ```
/// use anx_error::{AnxResult, RequestError, RequestErrorKind};
///
/// fn build() -> AnxResult<String> {
///     Err(RequestError::new(RequestErrorKind::TargetNotSet))?
/// }
/// assert!(build().is_err());
/// ```
pub type AnxResult<T> = std::result::Result<T, AnxError>;
