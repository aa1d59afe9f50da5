//! Error types for the anx REST API client.
//!
//! This crate provides the foundation error types used throughout the anx workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! Errors returned by the remote service are classified once into an
//! [`ApiErrorKind`] tag. Consumers such as the rate limiter switch on that tag
//! (see [`AnxError::is_rate_limit`]) instead of inspecting concrete types.
//!
//! # Examples
//!
//! ```
//! use anx_error::{AnxResult, NetworkError, NetworkErrorKind};
//!
//! fn fetch_data() -> AnxResult<String> {
//!     Err(NetworkError::new(NetworkErrorKind::ConnectionRefused, "api.example.com:443"))?
//! }
//!
//! match fetch_data() {
//!     Ok(data) => println!("Got: {}", data),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod api;
mod config;
mod error;
mod http;
mod json;
mod network;
mod rate_limit;
mod request;

pub use api::{ApiError, ApiErrorKind};
pub use config::ConfigError;
pub use error::{AnxError, AnxErrorKind, AnxResult};
pub use http::HttpError;
pub use json::JsonError;
pub use network::{NetworkError, NetworkErrorKind};
pub use rate_limit::{RateLimitError, RateLimitErrorKind};
pub use request::{RequestError, RequestErrorKind};
