//! Adaptive request admission for the anx REST API client.
//!
//! The remote service enforces separate request budgets for reads and writes
//! and advertises its current limits in response headers. This crate keeps
//! outbound traffic inside those budgets:
//!
//! - [`RequestQueue`] admits one class of requests per window, pauses when the
//!   window is spent, adopts new limits from `x-ratelimit-*` headers, and
//!   requeues requests the service rejected with a `retry-after` hint.
//! - [`RateLimitAdapter`] pairs a read queue and a write queue and routes each
//!   request by method.
//! - [`ConcurrencyLimiter`] caps in-flight requests regardless of window.
//!
//! Both adapters implement [`anx_core::Transport`], so they stack in front of
//! the raw transport without callers noticing.
//!
//! ```rust,ignore
//! use anx_rate_limit::{RateLimitAdapter, RateLimitHooks, RateLimitSettings};
//!
//! let hooks = RateLimitHooks::new().on_pause(|class| println!("{class} paused"));
//! let limiter = RateLimitAdapter::new(&RateLimitSettings::default(), hooks, transport)?;
//! let response = limiter.request(options).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod concurrency;
mod deferred;
mod detector;
mod hooks;
mod limiter;
mod request_queue;
mod settings;

pub use concurrency::ConcurrencyLimiter;
pub use detector::detect_limit;
pub use hooks::RateLimitHooks;
pub use limiter::RateLimitAdapter;
pub use request_queue::{
    DEFAULT_RETRY_DELAY, MAX_RETRY_DELAY, RETRY_AFTER_BUFFER, RequestQueue, SAFETY_BUFFER,
    WINDOW_BUFFER,
};
pub use settings::{
    DEFAULT_READ_LIMIT, DEFAULT_READ_LIMIT_HEADER, DEFAULT_READ_LIMIT_SECONDS, DEFAULT_WRITE_LIMIT,
    DEFAULT_WRITE_LIMIT_HEADER, DEFAULT_WRITE_LIMIT_SECONDS, MAX_WINDOW, QueueSettings,
    RateLimitSettings, RateLimitSettingsBuilder,
};
