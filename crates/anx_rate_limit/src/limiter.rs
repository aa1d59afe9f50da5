//! Read/write rate limiter installed in front of the transport.

use crate::hooks::RateLimitHooks;
use crate::request_queue::RequestQueue;
use crate::settings::RateLimitSettings;
use anx_core::{RateClass, RequestOptions, Response, SharedTransport, Transport};
use anx_error::AnxResult;
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Routes each request to the read or write [`RequestQueue`] by method.
///
/// `GET` requests are admitted under the read budget, everything else under
/// the write budget. The two queues share the downstream transport and the
/// hooks, but nothing else: a limit change or pause in one never affects the
/// other.
///
/// # Example
///
/// ```rust,ignore
/// use anx_rate_limit::{RateLimitAdapter, RateLimitHooks, RateLimitSettings};
///
/// let hooks = RateLimitHooks::new()
///     .on_exceeded(|class, err| eprintln!("{class}: {err}"));
/// let limiter = RateLimitAdapter::new(&RateLimitSettings::default(), hooks, transport)?;
///
/// // Drop-in replacement for the transport it wraps
/// let response = limiter.request(RequestOptions::from("/user")).await?;
/// ```
#[derive(Debug, Clone)]
pub struct RateLimitAdapter {
    read: RequestQueue,
    write: RequestQueue,
}

impl RateLimitAdapter {
    /// Build both queues in front of `transport`.
    ///
    /// # Errors
    ///
    /// Returns an error if either configured limit is zero.
    #[instrument(skip(hooks, transport))]
    pub fn new(
        settings: &RateLimitSettings,
        hooks: RateLimitHooks,
        transport: SharedTransport,
    ) -> AnxResult<Self> {
        settings.validate()?;
        debug!("Creating read/write rate limiter");
        Ok(Self {
            read: RequestQueue::new(
                settings.queue_settings(RateClass::Read),
                hooks.clone(),
                transport.clone(),
            )?,
            write: RequestQueue::new(settings.queue_settings(RateClass::Write), hooks, transport)?,
        })
    }

    /// The queue serving `class`.
    pub fn queue(&self, class: RateClass) -> &RequestQueue {
        match class {
            RateClass::Read => &self.read,
            RateClass::Write => &self.write,
        }
    }
}

#[async_trait]
impl Transport for RateLimitAdapter {
    async fn request(&self, options: RequestOptions) -> AnxResult<Response> {
        self.queue(options.rate_class()).enqueue(options).await
    }
}
