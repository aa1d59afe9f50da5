//! One-shot continuation for a queued request.

use anx_core::{RequestOptions, Response};
use anx_error::{AnxError, AnxResult};
use tokio::sync::oneshot;
use tracing::debug;

/// A request waiting in a queue, bound to the caller awaiting its result.
///
/// Resolving or rejecting consumes the value, so an entry can settle at most
/// once no matter how many times the queue retries it. Every code path in the
/// queue ends in one of the two, so it also settles at least once.
#[derive(Debug)]
pub(crate) struct Deferred {
    options: RequestOptions,
    responder: oneshot::Sender<AnxResult<Response>>,
}

impl Deferred {
    /// Create an entry and the receiver the caller awaits.
    pub(crate) fn new(options: RequestOptions) -> (Self, oneshot::Receiver<AnxResult<Response>>) {
        let (responder, receiver) = oneshot::channel();
        (Self { options, responder }, receiver)
    }

    pub(crate) fn options(&self) -> &RequestOptions {
        &self.options
    }

    pub(crate) fn resolve(self, response: Response) {
        self.settle(Ok(response));
    }

    pub(crate) fn reject(self, err: AnxError) {
        self.settle(Err(err));
    }

    fn settle(self, result: AnxResult<Response>) {
        if self.responder.send(result).is_err() {
            debug!(uri = %self.options.uri, "Caller stopped waiting; result discarded");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anx_error::{RequestError, RequestErrorKind};

    #[tokio::test]
    async fn resolve_delivers_response() {
        let (entry, receiver) = Deferred::new(RequestOptions::from("/user"));
        assert_eq!(entry.options().uri, "/user");
        entry.resolve(Response::new(200, serde_json::Value::Null));
        let response = receiver.await.unwrap().unwrap();
        assert_eq!(response.status_code, 200);
    }

    #[tokio::test]
    async fn reject_delivers_error() {
        let (entry, receiver) = Deferred::new(RequestOptions::from("/user"));
        entry.reject(RequestError::new(RequestErrorKind::TargetNotSet).into());
        assert!(receiver.await.unwrap().is_err());
    }

    #[test]
    fn settling_after_caller_left_is_harmless() {
        let (entry, receiver) = Deferred::new(RequestOptions::from("/user"));
        drop(receiver);
        entry.resolve(Response::default());
    }
}
