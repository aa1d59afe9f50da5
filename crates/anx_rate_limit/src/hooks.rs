//! Observability callbacks fired by the admission queues.

use anx_core::RateClass;
use anx_error::AnxError;
use std::fmt;
use std::sync::Arc;

type ClassHook = Arc<dyn Fn(RateClass) + Send + Sync>;
type ExceededHook = Arc<dyn Fn(RateClass, &AnxError) + Send + Sync>;

/// Callbacks invoked with the class tag of the queue that triggered them.
///
/// Every hook defaults to a no-op. Hooks run on the queue's task after its
/// internal lock is released, so they may freely issue new requests.
///
/// # Example
///
/// ```
/// use anx_rate_limit::RateLimitHooks;
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// let pauses = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&pauses);
/// let hooks = RateLimitHooks::new().on_pause(move |_class| {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
/// # let _ = hooks;
/// ```
#[derive(Clone, Default)]
pub struct RateLimitHooks {
    on_exceeded: Option<ExceededHook>,
    on_pause: Option<ClassHook>,
    on_resume: Option<ClassHook>,
}

impl RateLimitHooks {
    /// Hooks that do nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Called when the service rejects a request for exceeding its limit.
    pub fn on_exceeded<F>(mut self, hook: F) -> Self
    where
        F: Fn(RateClass, &AnxError) + Send + Sync + 'static,
    {
        self.on_exceeded = Some(Arc::new(hook));
        self
    }

    /// Called when a queue stops admitting and arms its pause timer.
    pub fn on_pause<F>(mut self, hook: F) -> Self
    where
        F: Fn(RateClass) + Send + Sync + 'static,
    {
        self.on_pause = Some(Arc::new(hook));
        self
    }

    /// Called when a pause timer fires and the window resets.
    pub fn on_resume<F>(mut self, hook: F) -> Self
    where
        F: Fn(RateClass) + Send + Sync + 'static,
    {
        self.on_resume = Some(Arc::new(hook));
        self
    }

    pub(crate) fn exceeded(&self, class: RateClass, err: &AnxError) {
        if let Some(hook) = &self.on_exceeded {
            hook(class, err);
        }
    }

    pub(crate) fn paused(&self, class: RateClass) {
        if let Some(hook) = &self.on_pause {
            hook(class);
        }
    }

    pub(crate) fn resumed(&self, class: RateClass) {
        if let Some(hook) = &self.on_resume {
            hook(class);
        }
    }
}

impl fmt::Debug for RateLimitHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimitHooks")
            .field("on_exceeded", &self.on_exceeded.is_some())
            .field("on_pause", &self.on_pause.is_some())
            .field("on_resume", &self.on_resume.is_some())
            .finish()
    }
}
