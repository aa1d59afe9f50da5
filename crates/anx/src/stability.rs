//! One-time warnings for experimental and deprecated API methods.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use tracing::warn;

/// Remembers which stability warnings were already emitted.
///
/// Each distinct warning is logged once per instance; the client owns one
/// so the cache lives as long as the client does.
///
/// # Example
///
/// ```
/// use anx::StabilityWarnings;
///
/// let warnings = StabilityWarnings::default();
/// assert!(warnings.experimental("search", "Creative"));
/// assert!(!warnings.experimental("search", "Creative"));
/// ```
#[derive(Debug, Default)]
pub struct StabilityWarnings {
    seen: Mutex<HashSet<String>>,
}

impl StabilityWarnings {
    /// Create an empty warning cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn first_time(&self, key: String) -> bool {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key)
    }

    /// Warn that `class.method` is experimental. Returns true if this call logged.
    pub fn experimental(&self, method: &str, class: &str) -> bool {
        if !self.first_time(format!("experimental:{class}.{method}")) {
            return false;
        }
        warn!("Method {class}.{method} is experimental, use with caution.");
        true
    }

    /// Warn that `class.method` is deprecated in favour of `class.replacement`.
    /// Returns true if this call logged.
    pub fn deprecated(&self, method: &str, class: &str, replacement: &str) -> bool {
        if !self.first_time(format!("deprecated:{class}.{method}:{replacement}")) {
            return false;
        }
        warn!("Method {class}.{method} is deprecated, use `{class}.{replacement}` instead");
        true
    }
}
