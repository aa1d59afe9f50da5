//! Errors raised while building a request, before anything is sent.

/// Invalid request conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum RequestErrorKind {
    /// The client has no target URL configured
    #[display("Target not set")]
    TargetNotSet,
    /// A request option failed validation
    #[display("Invalid {}", _0)]
    InvalidArgument(String),
}

/// Request construction error with location tracking.
///
/// # Examples
///
/// ```
/// use anx_error::{RequestError, RequestErrorKind};
///
/// let err = RequestError::new(RequestErrorKind::InvalidArgument("numElements".into()));
/// assert!(format!("{}", err).contains("Invalid numElements"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Request Error: {} at line {} in {}", kind, line, file)]
pub struct RequestError {
    /// The kind of error that occurred
    pub kind: RequestErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl RequestError {
    /// Create a new RequestError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: RequestErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
