//! Client configuration.

use anx_error::{AnxError, AnxResult, ConfigError};
use anx_rate_limit::RateLimitSettings;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, instrument};

/// Bundled default configuration.
pub const DEFAULT_CONFIG: &str = include_str!("../../../anx.toml");

/// `User-Agent` sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("anx/", env!("CARGO_PKG_VERSION"));

/// Page size used by `get_all` when the request does not set one.
pub const DEFAULT_CHUNK_SIZE: u64 = 100;

/// Settings for an [`AnxApi`](crate::AnxApi) client.
///
/// Loads from TOML with a precedence system, later sources winning:
/// 1. Bundled defaults (`anx.toml` shipped with the crate)
/// 2. `~/.config/anx/anx.toml`
/// 3. `./anx.toml`
/// 4. `ANX_*` environment variables (`ANX_TOKEN`, `ANX_RATE_LIMIT__RATE_LIMIT_READ`)
///
/// # Example
///
/// ```no_run
/// use anx::AnxConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut config = AnxConfig::load()?;
/// config.target = Some("https://api.example.com".to_string());
/// println!("timeout: {:?}", config.timeout());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnxConfig {
    /// Base URL requests are sent to
    pub target: Option<String>,
    /// Authorization token
    pub token: Option<String>,
    /// `User-Agent` header value
    pub user_agent: String,
    /// Default request timeout in milliseconds
    pub timeout_ms: u64,
    /// Headers added to every request
    pub headers: BTreeMap<String, String>,
    /// Install the read/write rate limiter
    pub rate_limiting: bool,
    /// Maximum simultaneous in-flight requests
    pub concurrency_limit: Option<usize>,
    /// Default `get_all` page size
    pub chunk_size: u64,
    /// Starting read/write limits
    pub rate_limit: RateLimitSettings,
}

impl Default for AnxConfig {
    fn default() -> Self {
        Self {
            target: None,
            token: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_ms: 60_000,
            headers: BTreeMap::new(),
            rate_limiting: true,
            concurrency_limit: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            rate_limit: RateLimitSettings::default(),
        }
    }
}

impl AnxConfig {
    /// Default timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from a specific file path.
    ///
    /// Keys missing from the file keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> AnxResult<Self> {
        debug!("Loading configuration from file");

        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                AnxError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?;
        Self::deserialize_validated(config)
    }

    /// Load configuration with precedence: environment > current dir > home dir > bundled defaults.
    ///
    /// User config files are optional and silently skipped if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if a present source cannot be parsed.
    #[instrument]
    pub fn load() -> AnxResult<Self> {
        debug!("Loading configuration with precedence: env > current dir > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/anx/anx.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder
            .add_source(File::with_name("anx").required(false))
            .add_source(
                Environment::with_prefix("ANX")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build().map_err(|e| {
            AnxError::from(ConfigError::new(format!(
                "Failed to build configuration: {}",
                e
            )))
        })?;
        Self::deserialize_validated(config)
    }

    fn deserialize_validated(config: Config) -> AnxResult<Self> {
        let parsed: Self = config.try_deserialize().map_err(|e| {
            AnxError::from(ConfigError::new(format!(
                "Failed to parse configuration: {}",
                e
            )))
        })?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Check values that would make the client unusable.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero timeout, page size or concurrency limit,
    /// a zero rate limit, or a target that is not an absolute URL.
    pub fn validate(&self) -> AnxResult<()> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::new("timeout_ms must be greater than zero").into());
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::new("chunk_size must be greater than zero").into());
        }
        if self.concurrency_limit == Some(0) {
            return Err(ConfigError::new("concurrency_limit must be at least 1").into());
        }
        if let Some(target) = self.target.as_deref().filter(|t| !t.is_empty()) {
            url::Url::parse(target).map_err(|e| {
                AnxError::from(ConfigError::new(format!("Invalid target {target}: {e}")))
            })?;
        }
        self.rate_limit.validate()
    }
}
