//! anx - rate-limited REST API client
//!
//! `anx` wraps a JSON REST API that enforces separate read and write request
//! budgets. It queues requests so they stay inside those budgets, adopts new
//! limits the moment the service advertises them, and retries rejected
//! requests after the server's `retry-after` hint.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use anx::{AnxApi, AnxConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = AnxConfig::load()?;
//!     config.target = Some("https://api.example.com".to_string());
//!     config.token = Some(std::env::var("ANX_TOKEN")?);
//!
//!     let api = AnxApi::new(config)?;
//!     let response = api.get("/user").await?;
//!     println!("{}", response.body);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `anx-error` - Error types
//! - `anx-core` - Request/response model, the `Transport` trait, classification
//! - `anx-rate-limit` - Request queues, read/write limiter, concurrency limiter
//!
//! This crate adds configuration, the reqwest transport and the client, and
//! re-exports the rest for convenience.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod config;
mod pipeline;
mod stability;
mod transport;

pub use client::{AnxApi, AnxApiBuilder, BeforeRequest, status_ok};
pub use config::{AnxConfig, DEFAULT_CHUNK_SIZE, DEFAULT_CONFIG, DEFAULT_USER_AGENT};
pub use pipeline::{AfterRequest, ResponseClassifier};
pub use stability::StabilityWarnings;
pub use transport::ReqwestTransport;

// Re-export the foundation crates
pub use anx_core::*;
pub use anx_error::*;
pub use anx_rate_limit::*;
