//! Rate limit configuration.

use anx_core::RateClass;
use anx_error::{AnxResult, ConfigError, RateLimitError, RateLimitErrorKind};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Read admissions per window when nothing else is configured.
pub const DEFAULT_READ_LIMIT: u32 = 100;
/// Read window length in seconds.
pub const DEFAULT_READ_LIMIT_SECONDS: u64 = 60;
/// Header advertising the current read limit.
pub const DEFAULT_READ_LIMIT_HEADER: &str = "x-ratelimit-read";
/// Write admissions per window when nothing else is configured.
pub const DEFAULT_WRITE_LIMIT: u32 = 60;
/// Write window length in seconds.
pub const DEFAULT_WRITE_LIMIT_SECONDS: u64 = 60;
/// Header advertising the current write limit.
pub const DEFAULT_WRITE_LIMIT_HEADER: &str = "x-ratelimit-write";
/// Longest window a queue accepts.
pub const MAX_WINDOW: Duration = Duration::from_secs(86_400);

/// Starting limits for the read and write queues.
///
/// These are only starting points: each queue adopts whatever limit the
/// service advertises in its responses.
///
/// # Example
///
/// ```toml
/// [rate_limit]
/// rate_limit_read = 100
/// rate_limit_read_seconds = 60
/// rate_limit_write = 60
/// rate_limit_write_seconds = 60
/// ```
///
/// ```
/// use anx_rate_limit::RateLimitSettings;
///
/// let settings = RateLimitSettings::builder()
///     .rate_limit_read(10u32)
///     .rate_limit_read_seconds(1u64)
///     .build()
///     .unwrap();
/// assert_eq!(*settings.rate_limit_read(), 10);
/// assert_eq!(*settings.rate_limit_write(), 60);
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[serde(default, deny_unknown_fields)]
#[builder(setter(into), default, build_fn(private, name = "build_internal"))]
pub struct RateLimitSettings {
    /// Read admissions per window
    rate_limit_read: u32,
    /// Read window in seconds
    rate_limit_read_seconds: u64,
    /// Write admissions per window
    rate_limit_write: u32,
    /// Write window in seconds
    rate_limit_write_seconds: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            rate_limit_read: DEFAULT_READ_LIMIT,
            rate_limit_read_seconds: DEFAULT_READ_LIMIT_SECONDS,
            rate_limit_write: DEFAULT_WRITE_LIMIT,
            rate_limit_write_seconds: DEFAULT_WRITE_LIMIT_SECONDS,
        }
    }
}

impl RateLimitSettingsBuilder {
    /// Build and validate the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if a limit is zero.
    pub fn build(&self) -> AnxResult<RateLimitSettings> {
        let settings = self
            .build_internal()
            .map_err(|e| ConfigError::new(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

impl RateLimitSettings {
    /// Creates a new settings builder.
    pub fn builder() -> RateLimitSettingsBuilder {
        RateLimitSettingsBuilder::default()
    }

    /// Reject limits that would never admit anything.
    ///
    /// # Errors
    ///
    /// Returns an error if either class has a zero limit or a window longer
    /// than [`MAX_WINDOW`].
    pub fn validate(&self) -> AnxResult<()> {
        for class in [RateClass::Read, RateClass::Write] {
            self.queue_settings(class).validate()?;
        }
        Ok(())
    }

    /// Settings for the queue serving `class`.
    pub fn queue_settings(&self, class: RateClass) -> QueueSettings {
        match class {
            RateClass::Read => QueueSettings {
                class,
                limit: self.rate_limit_read,
                window: Duration::from_secs(self.rate_limit_read_seconds),
                limit_header: DEFAULT_READ_LIMIT_HEADER.to_string(),
            },
            RateClass::Write => QueueSettings {
                class,
                limit: self.rate_limit_write,
                window: Duration::from_secs(self.rate_limit_write_seconds),
                limit_header: DEFAULT_WRITE_LIMIT_HEADER.to_string(),
            },
        }
    }
}

/// Settings for a single [`RequestQueue`](crate::RequestQueue).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSettings {
    /// Class tag passed to hooks and logs
    pub class: RateClass,
    /// Starting admissions per window
    pub limit: u32,
    /// Window length
    pub window: Duration,
    /// Response header that overrides `limit`
    pub limit_header: String,
}

impl QueueSettings {
    /// Reject a zero limit or a window longer than [`MAX_WINDOW`].
    ///
    /// # Errors
    ///
    /// Returns a rate limit error naming the offending class.
    pub fn validate(&self) -> AnxResult<()> {
        if self.limit == 0 {
            return Err(RateLimitError::new(RateLimitErrorKind::InvalidLimit(format!(
                "{} limit must be at least 1",
                self.class
            )))
            .into());
        }
        if self.window > MAX_WINDOW {
            return Err(RateLimitError::new(RateLimitErrorKind::InvalidLimit(format!(
                "{} window of {}s exceeds {}s",
                self.class,
                self.window.as_secs(),
                MAX_WINDOW.as_secs()
            )))
            .into());
        }
        Ok(())
    }
}
