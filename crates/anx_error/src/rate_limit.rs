//! Error types for the admission layer itself.

/// Error kinds for rate limiting and concurrency control.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub enum RateLimitErrorKind {
    /// A limit or window was configured as zero
    #[display("Invalid limit: {}", _0)]
    InvalidLimit(String),
    /// The queue dropped a request without settling it
    #[display("Queue closed: {}", _0)]
    QueueClosed(String),
}

/// Rate limiting error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Rate Limit Error: {} at line {} in {}", kind, line, file)]
pub struct RateLimitError {
    kind: RateLimitErrorKind,
    line: u32,
    file: &'static str,
}

impl RateLimitError {
    /// Create a new rate limiting error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: RateLimitErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &RateLimitErrorKind {
        &self.kind
    }
}
