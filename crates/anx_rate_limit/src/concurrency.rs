//! Cap on simultaneously in-flight requests.

use anx_core::{RequestOptions, Response, SharedTransport, Transport};
use anx_error::{AnxResult, RateLimitError, RateLimitErrorKind};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Semaphore;
use tracing::{debug, instrument};

/// Keeps the backlog count accurate even if the caller abandons the wait.
struct BacklogGuard<'a>(&'a AtomicUsize);

impl<'a> BacklogGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for BacklogGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Limits how many requests run at once, independent of any time window.
///
/// Requests beyond the limit wait in arrival order; the semaphore hands out
/// permits first come, first served. A permit is released when its request
/// settles, successfully or not, which starts the next waiting request.
///
/// # Example
///
/// ```rust,ignore
/// use anx_rate_limit::ConcurrencyLimiter;
///
/// // One request at a time
/// let limiter = ConcurrencyLimiter::new(1, transport)?;
/// let response = limiter.request(options).await?;
/// ```
pub struct ConcurrencyLimiter {
    limit: usize,
    permits: Arc<Semaphore>,
    backlog: AtomicUsize,
    transport: SharedTransport,
}

impl ConcurrencyLimiter {
    /// Wrap `transport` so at most `limit` requests are in flight.
    ///
    /// # Errors
    ///
    /// Returns an error if `limit` is zero.
    pub fn new(limit: usize, transport: SharedTransport) -> AnxResult<Self> {
        if limit == 0 {
            return Err(RateLimitError::new(RateLimitErrorKind::InvalidLimit(
                "concurrency limit must be at least 1".to_string(),
            ))
            .into());
        }
        debug!(limit, "Creating concurrency limiter");
        Ok(Self {
            limit,
            permits: Arc::new(Semaphore::new(limit)),
            backlog: AtomicUsize::new(0),
            transport,
        })
    }

    /// Maximum simultaneous requests.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Requests currently running.
    pub fn in_flight(&self) -> usize {
        self.limit - self.permits.available_permits()
    }

    /// Requests waiting for a slot.
    pub fn backlog_len(&self) -> usize {
        self.backlog.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for ConcurrencyLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrencyLimiter")
            .field("limit", &self.limit)
            .field("in_flight", &self.in_flight())
            .field("backlog", &self.backlog_len())
            .finish()
    }
}

#[async_trait]
impl Transport for ConcurrencyLimiter {
    #[instrument(skip(self, options), fields(uri = %options.uri))]
    async fn request(&self, options: RequestOptions) -> AnxResult<Response> {
        let permit = {
            let _waiting = BacklogGuard::enter(&self.backlog);
            Arc::clone(&self.permits).acquire_owned().await.map_err(|_| {
                RateLimitError::new(RateLimitErrorKind::QueueClosed(
                    "concurrency limiter closed".to_string(),
                ))
            })?
        };
        debug!(in_flight = self.in_flight(), "Starting request");

        let result = self.transport.request(options).await;
        drop(permit);
        result
    }
}
