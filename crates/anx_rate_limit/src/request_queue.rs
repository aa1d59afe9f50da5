//! Single-class admission queue.
//!
//! A [`RequestQueue`] admits at most `limit - SAFETY_BUFFER` requests per
//! window. Requests beyond that wait in FIFO order until a pause timer resets
//! the window. The limit itself follows the service: whenever a response
//! advertises a different value in the queue's limit header, the queue adopts
//! it and restarts the window.
//!
//! When the service rejects a request anyway, the rejection's `retry-after`
//! hint decides what happens. With a hint, the queue stops admitting, puts
//! the request back at the end of the line and sleeps for the hinted delay.
//! Without one, or with one longer than [`MAX_RETRY_DELAY`], the caller gets
//! the error.
//!
//! Admitted requests go to a single dispatcher task per queue, which starts
//! them in admission order and drives them concurrently.
//!
//! State transitions:
//!
//! ```text
//! Idle ──enqueue──▶ Draining ──window spent / rejected──▶ Paused
//!                      ▲                                    │
//!                      └────────────timer fires─────────────┘
//! ```

use crate::deferred::Deferred;
use crate::detector::detect_limit;
use crate::hooks::RateLimitHooks;
use crate::settings::QueueSettings;
use anx_core::{RateClass, RequestOptions, Response, SharedTransport};
use anx_error::{AnxError, AnxResult, RateLimitError, RateLimitErrorKind};
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

/// Admissions held back from each window to absorb races with the server's counter.
pub const SAFETY_BUFFER: u32 = 4;
/// Slack added to every window so local resets never run ahead of the server's.
pub const WINDOW_BUFFER: Duration = Duration::from_secs(1);
/// Slack added to a server supplied `retry-after` delay.
pub const RETRY_AFTER_BUFFER: Duration = Duration::from_secs(1);
/// Delay used when the server's retry hint is zero.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(60);
/// Longest retry delay the queue waits out. Longer hints reject the request.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(86_400);

/// Armed pause timer. `handle` is attached once the timer task is spawned.
#[derive(Debug)]
struct PauseTimer {
    epoch: u64,
    handle: Option<JoinHandle<()>>,
}

#[derive(Debug)]
struct QueueState {
    pending: VecDeque<Deferred>,
    admitted: u32,
    limit: u32,
    window: Duration,
    expires_at: Instant,
    /// Set by a server rejection; no admissions until the next window.
    blocked: bool,
    pause: Option<PauseTimer>,
    /// Incremented per armed timer so a superseded timer can tell it is stale.
    epoch: u64,
}

impl QueueState {
    fn capacity(&self) -> u32 {
        self.limit.saturating_sub(SAFETY_BUFFER).max(1)
    }

    /// Pop every entry the current window still has room for.
    fn take_admissible(&mut self) -> Vec<Deferred> {
        let mut ready = Vec::new();
        while !self.blocked && self.admitted < self.capacity() {
            let Some(entry) = self.pending.pop_front() else {
                break;
            };
            self.admitted += 1;
            ready.push(entry);
        }
        ready
    }

    /// Cancel any armed timer and start a fresh window from now.
    fn reset_window(&mut self) {
        if let Some(handle) = self.pause.take().and_then(|timer| timer.handle) {
            handle.abort();
        }
        self.expires_at = Instant::now() + self.window + WINDOW_BUFFER;
    }

    /// Reserve the pause timer slot. Returns the timer's epoch and delay, or
    /// `None` if a timer is already armed (the armed one wins).
    fn arm_pause(&mut self, retry_delay: Option<Duration>) -> Option<(u64, Duration)> {
        if self.pause.is_some() {
            return None;
        }
        let delay = retry_delay
            .unwrap_or_else(|| self.expires_at.saturating_duration_since(Instant::now()));
        self.epoch += 1;
        self.pause = Some(PauseTimer {
            epoch: self.epoch,
            handle: None,
        });
        Some((self.epoch, delay))
    }
}

struct Shared {
    class: RateClass,
    limit_header: String,
    transport: SharedTransport,
    hooks: RateLimitHooks,
    state: Mutex<QueueState>,
    dispatcher: OnceLock<mpsc::UnboundedSender<Deferred>>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        // Bookkeeping never panics mid-update, so a poisoned lock is still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admit what the window allows and pause if anything is left over.
    fn process(self: &Arc<Self>, retry_delay: Option<Duration>) {
        let armed = {
            let mut state = self.lock();
            // Dispatch under the lock so concurrent callers cannot interleave batches.
            self.dispatch(state.take_admissible());
            if state.pending.is_empty() {
                None
            } else {
                state.arm_pause(retry_delay)
            }
        };

        if let Some((epoch, delay)) = armed {
            debug!(class = %self.class, delay_ms = delay.as_millis() as u64, "Pausing admissions");
            self.hooks.paused(self.class);
            self.start_timer(epoch, delay);
        }
    }

    /// Send admitted entries to the dispatcher, spawning it on first use.
    fn dispatch(self: &Arc<Self>, ready: Vec<Deferred>) {
        if ready.is_empty() {
            return;
        }
        let sender = self.dispatcher.get_or_init(|| {
            let (sender, receiver) = mpsc::unbounded_channel();
            tokio::spawn(run_dispatcher(Arc::downgrade(self), receiver));
            sender
        });
        for entry in ready {
            if let Err(mpsc::error::SendError(entry)) = sender.send(entry) {
                entry.reject(
                    RateLimitError::new(RateLimitErrorKind::QueueClosed(format!(
                        "{} dispatcher stopped",
                        self.class
                    )))
                    .into(),
                );
            }
        }
    }

    fn start_timer(self: &Arc<Self>, epoch: u64, delay: Duration) {
        let shared = Arc::clone(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            shared.resume(epoch);
        });

        let mut state = self.lock();
        match state.pause.as_mut() {
            Some(timer) if timer.epoch == epoch => timer.handle = Some(handle),
            // The window was reset before the timer could be attached.
            _ => handle.abort(),
        }
    }

    fn resume(self: &Arc<Self>, epoch: u64) {
        {
            let mut state = self.lock();
            if state.pause.as_ref().map(|timer| timer.epoch) != Some(epoch) {
                return;
            }
            // Detach rather than abort: this is the timer's own task.
            state.pause = None;
            state.reset_window();
            state.admitted = 0;
            state.blocked = false;
        }
        debug!(class = %self.class, "Resuming admissions");
        self.hooks.resumed(self.class);
        self.process(None);
    }

    fn complete(self: &Arc<Self>, entry: Deferred, result: AnxResult<Response>) {
        match result {
            Ok(response) => {
                self.adapt_limit(&response);
                entry.resolve(response);
            }
            Err(err) if err.is_rate_limit() => self.handle_rejection(entry, err),
            Err(err) => entry.reject(err),
        }
    }

    fn handle_rejection(self: &Arc<Self>, entry: Deferred, err: AnxError) {
        self.hooks.exceeded(self.class, &err);

        let Some(retry_after) = err.retry_after() else {
            warn!(class = %self.class, uri = %entry.options().uri, "Rate limited without retry hint");
            entry.reject(err);
            return;
        };
        let delay = if retry_after == 0 {
            DEFAULT_RETRY_DELAY
        } else {
            Duration::from_secs(retry_after).saturating_add(RETRY_AFTER_BUFFER)
        };
        if delay > MAX_RETRY_DELAY {
            warn!(
                class = %self.class,
                uri = %entry.options().uri,
                retry_after,
                "Retry hint exceeds the longest supported delay"
            );
            entry.reject(err);
            return;
        }
        warn!(
            class = %self.class,
            uri = %entry.options().uri,
            retry_after,
            "Rate limited; requeueing"
        );

        {
            let mut state = self.lock();
            state.blocked = true;
            state.pending.push_back(entry);
        }
        self.process(Some(delay));
    }

    fn adapt_limit(self: &Arc<Self>, response: &Response) {
        let Some(limit) = detect_limit(response, &self.limit_header) else {
            return;
        };
        let previous = {
            let mut state = self.lock();
            if state.limit == limit {
                return;
            }
            let previous = state.limit;
            state.limit = limit;
            state.reset_window();
            previous
        };
        debug!(class = %self.class, previous, limit, "Adopted limit from response header");
        self.process(None);
    }
}

/// Start admitted requests in the order they arrive and drive them to completion.
async fn run_dispatcher(shared: Weak<Shared>, mut receiver: mpsc::UnboundedReceiver<Deferred>) {
    let mut in_flight = FuturesUnordered::new();
    loop {
        tokio::select! {
            biased;
            received = receiver.recv() => {
                let Some(entry) = received else {
                    break;
                };
                // The queue is gone; dropping the entry settles its caller.
                let Some(shared) = shared.upgrade() else {
                    continue;
                };
                in_flight.push(async move {
                    let result = shared.transport.request(entry.options().clone()).await;
                    shared.complete(entry, result);
                });
            }
            Some(()) = in_flight.next(), if !in_flight.is_empty() => {}
        }
    }
    while in_flight.next().await.is_some() {}
}

/// Admission queue for one class of requests.
///
/// Cloning yields another handle to the same queue.
///
/// # Example
///
/// ```rust,ignore
/// use anx_core::RateClass;
/// use anx_rate_limit::{RateLimitHooks, RateLimitSettings, RequestQueue};
///
/// let settings = RateLimitSettings::default().queue_settings(RateClass::Read);
/// let queue = RequestQueue::new(settings, RateLimitHooks::new(), transport)?;
/// let response = queue.enqueue(options).await?;
/// ```
#[derive(Clone)]
pub struct RequestQueue {
    shared: Arc<Shared>,
}

impl RequestQueue {
    /// Create a queue that forwards admitted requests to `transport`.
    ///
    /// # Errors
    ///
    /// Returns an error if `settings.limit` is zero or `settings.window` is
    /// longer than [`MAX_WINDOW`](crate::MAX_WINDOW).
    pub fn new(
        settings: QueueSettings,
        hooks: RateLimitHooks,
        transport: SharedTransport,
    ) -> AnxResult<Self> {
        settings.validate()?;
        debug!(
            class = %settings.class,
            limit = settings.limit,
            window_secs = settings.window.as_secs(),
            header = %settings.limit_header,
            "Creating request queue"
        );

        let state = QueueState {
            pending: VecDeque::new(),
            admitted: 0,
            limit: settings.limit,
            window: settings.window,
            expires_at: Instant::now() + settings.window + WINDOW_BUFFER,
            blocked: false,
            pause: None,
            epoch: 0,
        };
        Ok(Self {
            shared: Arc::new(Shared {
                class: settings.class,
                limit_header: settings.limit_header,
                transport,
                hooks,
                state: Mutex::new(state),
                dispatcher: OnceLock::new(),
            }),
        })
    }

    /// Queue a request and wait for its result.
    ///
    /// The request is admitted as soon as the window has room. Rate limit
    /// rejections carrying a retry hint are retried transparently; every other
    /// outcome is returned as-is.
    ///
    /// # Errors
    ///
    /// Returns the transport's error, or a rate limit error without a retry hint.
    #[instrument(skip(self, options), fields(class = %self.shared.class, uri = %options.uri))]
    pub async fn enqueue(&self, options: RequestOptions) -> AnxResult<Response> {
        let (entry, receiver) = Deferred::new(options);
        self.shared.lock().pending.push_back(entry);
        self.shared.process(None);

        match receiver.await {
            Ok(result) => result,
            Err(_) => Err(RateLimitError::new(RateLimitErrorKind::QueueClosed(format!(
                "{} queue dropped a request",
                self.shared.class
            )))
            .into()),
        }
    }

    /// Class this queue admits.
    pub fn class(&self) -> RateClass {
        self.shared.class
    }

    /// True while a pause timer is armed.
    pub fn is_paused(&self) -> bool {
        self.shared.lock().pause.is_some()
    }

    /// Requests waiting for admission.
    pub fn pending_len(&self) -> usize {
        self.shared.lock().pending.len()
    }

    /// Current admissions-per-window limit.
    pub fn limit(&self) -> u32 {
        self.shared.lock().limit
    }

    /// Requests admitted in the current window.
    pub fn admitted(&self) -> u32 {
        self.shared.lock().admitted
    }
}

impl std::fmt::Debug for RequestQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("RequestQueue")
            .field("class", &self.shared.class)
            .field("limit", &state.limit)
            .field("admitted", &state.admitted)
            .field("pending", &state.pending.len())
            .field("paused", &state.pause.is_some())
            .finish()
    }
}
