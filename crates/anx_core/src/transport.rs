//! The call shape shared by every stage of the request pipeline.

use crate::{RequestOptions, Response};
use anx_error::AnxResult;
use async_trait::async_trait;
use std::sync::Arc;

/// Issues a request and eventually yields a response or an error.
///
/// The raw HTTP adapter implements this, and so does every adapter layered
/// in front of it (classifier, concurrency limiter, rate limiter). A caller
/// cannot tell how many layers sit between it and the network.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute one request.
    async fn request(&self, options: RequestOptions) -> AnxResult<Response>;
}

/// Reference-counted transport shared between pipeline stages.
pub type SharedTransport = Arc<dyn Transport>;

#[async_trait]
impl<T> Transport for Arc<T>
where
    T: Transport + ?Sized,
{
    async fn request(&self, options: RequestOptions) -> AnxResult<Response> {
        (**self).request(options).await
    }
}
