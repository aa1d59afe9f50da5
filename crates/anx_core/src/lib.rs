//! Core data types for the anx REST API client.
//!
//! This crate provides the request descriptor, the normalized response, and the
//! [`Transport`] trait that every stage of the request pipeline implements:
//! the raw HTTP adapter, the response classifier, the concurrency limiter and
//! the rate limiter all share the same call shape, so each one is a drop-in
//! replacement for the next.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod classify;
mod method;
mod options;
mod response;
mod telemetry;
mod transport;

pub use classify::{build_error, classify_response};
pub use method::{Method, RateClass};
pub use options::{RequestOptions, RequestOptionsBuilder};
pub use response::Response;
pub use telemetry::init_tracing;
pub use transport::{SharedTransport, Transport};
