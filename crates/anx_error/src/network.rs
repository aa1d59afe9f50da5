//! Transport-level failures.

/// Network failure conditions surfaced by the transport adapter.
///
/// None of these are retried by the admission queues.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum NetworkErrorKind {
    /// Host name could not be resolved
    #[display("DNS Lookup Error")]
    DnsLookup,
    /// Connection was aborted before completion
    #[display("Connection Aborted Error")]
    ConnectionAborted,
    /// Remote refused the connection
    #[display("Connection Refused Error")]
    ConnectionRefused,
    /// Remote reset the connection
    #[display("Connection Reset Error")]
    ConnectionReset,
    /// Connection could not be established in time
    #[display("Connection Timeout Error")]
    ConnectionTimeout,
    /// Established connection stalled past the request timeout
    #[display("Timeout Error")]
    SocketTimeout,
    /// Any other transport failure
    #[display("Network Error")]
    Other,
}

impl NetworkErrorKind {
    /// Map an I/O error kind from the socket layer to a network error kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use anx_error::NetworkErrorKind;
    /// use std::io::ErrorKind;
    ///
    /// assert_eq!(
    ///     NetworkErrorKind::from_io_kind(ErrorKind::ConnectionReset),
    ///     NetworkErrorKind::ConnectionReset
    /// );
    /// assert_eq!(NetworkErrorKind::from_io_kind(ErrorKind::Other), NetworkErrorKind::Other);
    /// ```
    pub fn from_io_kind(kind: std::io::ErrorKind) -> Self {
        use std::io::ErrorKind;
        match kind {
            ErrorKind::ConnectionAborted => NetworkErrorKind::ConnectionAborted,
            ErrorKind::ConnectionRefused => NetworkErrorKind::ConnectionRefused,
            ErrorKind::ConnectionReset => NetworkErrorKind::ConnectionReset,
            ErrorKind::TimedOut => NetworkErrorKind::ConnectionTimeout,
            _ => NetworkErrorKind::Other,
        }
    }
}

/// Network error with the failing target and source location.
///
/// # Examples
///
/// ```
/// use anx_error::{NetworkError, NetworkErrorKind};
///
/// let err = NetworkError::new(NetworkErrorKind::DnsLookup, "api.example.invalid");
/// assert!(format!("{}", err).contains("DNS Lookup Error"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Network Error: {}: {} at line {} in {}", kind, detail, line, file)]
pub struct NetworkError {
    /// The kind of failure
    pub kind: NetworkErrorKind,
    /// Host, URI or underlying message
    pub detail: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl NetworkError {
    /// Create a new NetworkError at the current location.
    #[track_caller]
    pub fn new(kind: NetworkErrorKind, detail: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            detail: detail.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
