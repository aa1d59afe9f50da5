//! Classification stage between the rate limiter and the raw transport.

use anx_core::{RequestOptions, Response, SharedTransport, Transport, classify_response};
use anx_error::AnxResult;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::debug;

/// Inspects or rewrites a response before it is classified.
pub type AfterRequest = Arc<dyn Fn(&mut Response) + Send + Sync>;

/// Turns error responses from the transport into typed errors.
///
/// The raw transport hands back any status as a response. This stage fills
/// in `total_time`, runs the `after_request` hook and then classifies, so
/// the rate limiter above it sees 405/429 rejections as rate limit errors.
pub struct ResponseClassifier {
    transport: SharedTransport,
    after_request: Option<AfterRequest>,
}

impl ResponseClassifier {
    /// Classify responses from `transport`.
    pub fn new(transport: SharedTransport, after_request: Option<AfterRequest>) -> Self {
        Self {
            transport,
            after_request,
        }
    }
}

impl std::fmt::Debug for ResponseClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseClassifier")
            .field("after_request", &self.after_request.is_some())
            .finish()
    }
}

#[async_trait]
impl Transport for ResponseClassifier {
    async fn request(&self, options: RequestOptions) -> AnxResult<Response> {
        let started = Instant::now();
        let mut response = self.transport.request(options.clone()).await?;

        response.total_time = started.elapsed();
        if response.request_time.is_zero() {
            response.request_time = response.total_time;
        }
        if let Some(hook) = &self.after_request {
            hook(&mut response);
        }

        match classify_response(&options, &response) {
            Some(err) => Err(err),
            None => {
                debug!(status = response.status_code, uri = %options.uri, "Request succeeded");
                Ok(response)
            }
        }
    }
}
