//! Limit detection from response headers.
//!
//! The service reports the caller's current per-class budget on every
//! response (`x-ratelimit-read`, `x-ratelimit-write`). The value reflects the
//! account's real limit, so it takes precedence over configured defaults.

use anx_core::Response;
use tracing::debug;

/// Parse a limit header into a positive admission count.
///
/// Missing headers, non-numeric values and zero are all treated as "no
/// information" and return `None`.
///
/// # Example
///
/// ```
/// use anx_core::Response;
/// use anx_rate_limit::detect_limit;
///
/// let response = Response::default().with_header("x-ratelimit-read", "250");
/// assert_eq!(detect_limit(&response, "x-ratelimit-read"), Some(250));
/// assert_eq!(detect_limit(&response, "x-ratelimit-write"), None);
/// ```
pub fn detect_limit(response: &Response, header: &str) -> Option<u32> {
    let raw = response.header(header)?;
    match raw.trim().parse::<u32>() {
        Ok(0) | Err(_) => {
            debug!(header, value = raw, "Ignoring unusable rate limit header");
            None
        }
        Ok(limit) => Some(limit),
    }
}
