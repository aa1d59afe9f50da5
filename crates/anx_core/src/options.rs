//! Request descriptor passed through the transport pipeline.

use crate::{Method, RateClass};
use anx_error::{AnxResult, RequestError, RequestErrorKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Everything needed to issue one request.
///
/// The admission layer treats this as an opaque value and only looks at
/// [`RequestOptions::method`] for routing. The client fills in the absolute
/// URI, headers and query parameters before handing it to the pipeline.
///
/// # Examples
///
/// ```
/// use anx_core::{Method, RequestOptions};
/// use serde_json::json;
///
/// let options = RequestOptions::builder()
///     .method(Method::Post)
///     .uri("/creative")
///     .body(json!({ "creative": { "name": "banner" } }))
///     .build()
///     .unwrap();
///
/// assert_eq!(options.method, Method::Post);
/// assert!(options.body.is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, derive_builder::Builder)]
#[builder(setter(into), default, build_fn(private, name = "build_internal"))]
pub struct RequestOptions {
    /// HTTP method
    pub method: Method,
    /// Path relative to the target, or an absolute URL once built
    pub uri: String,
    /// Request headers; later layers may add to these
    pub headers: BTreeMap<String, String>,
    /// Query string parameters
    pub params: BTreeMap<String, String>,
    /// JSON payload
    pub body: Option<serde_json::Value>,
    /// Per-request timeout, overriding the client default
    pub timeout: Option<Duration>,
    /// Pagination offset (`start_element`)
    pub start_element: Option<u64>,
    /// Pagination page size (`num_elements`)
    pub num_elements: Option<u64>,
    /// Sets `Accept` (and `Content-Type` for POST/PUT) when present
    pub mime_type: Option<String>,
    /// Skip injecting the configured `Authorization` token
    pub no_auth: bool,
    /// Percent-encode query parameters
    pub encode_params: bool,
}

impl RequestOptionsBuilder {
    /// Build the RequestOptions.
    ///
    /// # Errors
    ///
    /// Returns an error if a field could not be built.
    pub fn build(&self) -> AnxResult<RequestOptions> {
        self.build_internal()
            .map_err(|e| RequestError::new(RequestErrorKind::InvalidArgument(e.to_string())).into())
    }
}

impl RequestOptions {
    /// Creates a new options builder.
    pub fn builder() -> RequestOptionsBuilder {
        RequestOptionsBuilder::default()
    }

    /// Options for `method` on `uri` with everything else defaulted.
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            ..Default::default()
        }
    }

    /// Rate limit class this request is admitted under.
    pub fn rate_class(&self) -> RateClass {
        self.method.rate_class()
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl From<&str> for RequestOptions {
    fn from(uri: &str) -> Self {
        Self::new(Method::Get, uri)
    }
}

impl From<String> for RequestOptions {
    fn from(uri: String) -> Self {
        Self::new(Method::Get, uri)
    }
}
