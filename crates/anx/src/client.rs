//! The REST client: request preparation, verbs and pagination.

use crate::config::AnxConfig;
use crate::pipeline::{AfterRequest, ResponseClassifier};
use crate::stability::StabilityWarnings;
use crate::transport::ReqwestTransport;
use anx_core::{Method, RequestOptions, Response, SharedTransport};
use anx_error::{AnxResult, ApiError, ApiErrorKind, RequestError, RequestErrorKind};
use anx_rate_limit::{ConcurrencyLimiter, RateLimitAdapter, RateLimitHooks};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Adjusts a fully prepared request just before it enters the pipeline.
pub type BeforeRequest = Arc<dyn Fn(&mut RequestOptions) + Send + Sync>;

const JSON_MIME: &str = "application/json";

/// True if `body.response.status` is `"OK"`.
///
/// # Example
///
/// ```
/// use anx::status_ok;
/// use serde_json::json;
///
/// assert!(status_ok(&json!({ "response": { "status": "OK" } })));
/// assert!(!status_ok(&json!({ "response": { "status": "error" } })));
/// ```
pub fn status_ok(body: &Value) -> bool {
    body.pointer("/response/status").and_then(Value::as_str) == Some("OK")
}

/// Insert a header, replacing any existing entry that differs only in case.
fn set_header(headers: &mut BTreeMap<String, String>, name: &str, value: &str) {
    headers.retain(|key, _| !key.eq_ignore_ascii_case(name));
    headers.insert(name.to_string(), value.to_string());
}

fn join_uri(target: &str, uri: &str) -> String {
    format!(
        "{}/{}",
        target.trim_end_matches('/'),
        uri.trim_start_matches('/')
    )
}

fn query_string(params: &BTreeMap<String, String>, encode: bool) -> String {
    if encode {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .finish()
    } else {
        params
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Assembles an [`AnxApi`] with optional custom transport and hooks.
///
/// # Example
///
/// ```rust,ignore
/// use anx::{AnxApi, AnxConfig, RateLimitHooks};
///
/// let api = AnxApi::builder(config)
///     .rate_limit_hooks(RateLimitHooks::new().on_pause(|class| println!("{class} paused")))
///     .before_request(|options| {
///         options.headers.insert("X-Trace".into(), "1".into());
///     })
///     .build()?;
/// ```
pub struct AnxApiBuilder {
    config: AnxConfig,
    transport: Option<SharedTransport>,
    rate_limit_hooks: RateLimitHooks,
    before_request: Option<BeforeRequest>,
    after_request: Option<AfterRequest>,
}

impl AnxApiBuilder {
    /// Send requests through `transport` instead of reqwest.
    pub fn transport(mut self, transport: SharedTransport) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Callbacks for rate limit events.
    pub fn rate_limit_hooks(mut self, hooks: RateLimitHooks) -> Self {
        self.rate_limit_hooks = hooks;
        self
    }

    /// Adjust each prepared request before it is sent.
    pub fn before_request<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut RequestOptions) + Send + Sync + 'static,
    {
        self.before_request = Some(Arc::new(hook));
        self
    }

    /// Inspect or rewrite each response before it is classified.
    pub fn after_request<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Response) + Send + Sync + 'static,
    {
        self.after_request = Some(Arc::new(hook));
        self
    }

    /// Validate the configuration and assemble the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid configuration or if the HTTP client
    /// cannot be created.
    #[instrument(skip(self), fields(rate_limiting = self.config.rate_limiting, concurrency_limit = ?self.config.concurrency_limit))]
    pub fn build(self) -> AnxResult<AnxApi> {
        self.config.validate()?;

        let transport: SharedTransport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };
        let transport: SharedTransport = match self.config.concurrency_limit {
            Some(limit) => Arc::new(ConcurrencyLimiter::new(limit, transport)?),
            None => transport,
        };
        let classified: SharedTransport =
            Arc::new(ResponseClassifier::new(transport, self.after_request));

        let (pipeline, limiter) = if self.config.rate_limiting {
            let limiter =
                RateLimitAdapter::new(&self.config.rate_limit, self.rate_limit_hooks, classified)?;
            let pipeline: SharedTransport = Arc::new(limiter.clone());
            (pipeline, Some(limiter))
        } else {
            (classified, None)
        };
        debug!("Client pipeline assembled");

        Ok(AnxApi {
            config: self.config,
            pipeline,
            limiter,
            before_request: self.before_request,
            stability: StabilityWarnings::new(),
        })
    }
}

/// Client for a REST API with per-class rate limits.
///
/// Requests flow through an optional rate limiter, a response classifier,
/// an optional concurrency limiter and finally the transport.
///
/// # Example
///
/// ```rust,ignore
/// use anx::{AnxApi, AnxConfig};
///
/// let mut config = AnxConfig::load()?;
/// config.target = Some("https://api.example.com".into());
/// let api = AnxApi::new(config)?;
///
/// let user = api.get("/user").await?;
/// let everything = api.get_all("/creative").await?;
/// ```
pub struct AnxApi {
    config: AnxConfig,
    pipeline: SharedTransport,
    limiter: Option<RateLimitAdapter>,
    before_request: Option<BeforeRequest>,
    stability: StabilityWarnings,
}

impl AnxApi {
    /// Start assembling a client.
    pub fn builder(config: AnxConfig) -> AnxApiBuilder {
        AnxApiBuilder {
            config,
            transport: None,
            rate_limit_hooks: RateLimitHooks::new(),
            before_request: None,
            after_request: None,
        }
    }

    /// Client sending requests over HTTP with reqwest.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid configuration.
    pub fn new(config: AnxConfig) -> AnxResult<Self> {
        Self::builder(config).build()
    }

    /// Client sending requests through a custom transport.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid configuration.
    pub fn with_transport(config: AnxConfig, transport: SharedTransport) -> AnxResult<Self> {
        Self::builder(config).transport(transport).build()
    }

    /// Active configuration.
    pub fn config(&self) -> &AnxConfig {
        &self.config
    }

    /// The rate limiter, when rate limiting is enabled.
    pub fn limiter(&self) -> Option<&RateLimitAdapter> {
        self.limiter.as_ref()
    }

    /// Warning cache for experimental and deprecated endpoints.
    pub fn stability(&self) -> &StabilityWarnings {
        &self.stability
    }

    /// Resolve relative options into the request actually sent.
    ///
    /// # Errors
    ///
    /// Returns an error if no target is configured.
    pub fn prepare(&self, options: RequestOptions) -> AnxResult<RequestOptions> {
        let target = self
            .config
            .target
            .as_deref()
            .filter(|target| !target.is_empty())
            .ok_or_else(|| RequestError::new(RequestErrorKind::TargetNotSet))?;

        let mut headers = self.config.headers.clone();
        if !self.config.user_agent.is_empty() {
            set_header(&mut headers, "User-Agent", &self.config.user_agent);
        }
        if !options.no_auth
            && let Some(token) = self.config.token.as_deref().filter(|t| !t.is_empty())
        {
            set_header(&mut headers, "Authorization", token);
        }
        let has_body = options.method.has_body();
        match options.mime_type.as_deref() {
            Some(mime) => {
                set_header(&mut headers, "Accept", mime);
                if has_body {
                    set_header(&mut headers, "Content-Type", mime);
                }
            }
            None => {
                set_header(&mut headers, "Accept", JSON_MIME);
                if has_body {
                    set_header(&mut headers, "Content-Type", JSON_MIME);
                }
            }
        }
        for (name, value) in &options.headers {
            set_header(&mut headers, name, value);
        }

        let mut params = options.params.clone();
        if let Some(start) = options.start_element {
            params.insert("start_element".to_string(), start.to_string());
        }
        if let Some(num) = options.num_elements {
            params.insert("num_elements".to_string(), num.to_string());
            params
                .entry("start_element".to_string())
                .or_insert_with(|| "0".to_string());
        }

        let mut uri = join_uri(target, &options.uri);
        let query = query_string(&params, options.encode_params);
        if !query.is_empty() {
            uri.push(if options.uri.contains('?') { '&' } else { '?' });
            uri.push_str(&query);
        }

        let mut prepared = RequestOptions {
            method: options.method,
            uri,
            headers,
            params,
            body: options.body,
            timeout: Some(options.timeout.unwrap_or_else(|| self.config.timeout())),
            start_element: options.start_element,
            num_elements: options.num_elements,
            mime_type: options.mime_type,
            no_auth: options.no_auth,
            encode_params: options.encode_params,
        };
        if let Some(hook) = &self.before_request {
            hook(&mut prepared);
        }
        Ok(prepared)
    }

    /// Send a request using the method in `options`.
    ///
    /// # Errors
    ///
    /// Returns a request error if no target is configured, a network error if
    /// the transport fails, or an API error for failed responses.
    #[instrument(skip(self, options), fields(method = %options.method, uri = %options.uri))]
    pub async fn request(&self, options: RequestOptions) -> AnxResult<Response> {
        let prepared = self.prepare(options)?;
        self.pipeline.request(prepared).await
    }

    async fn send(
        &self,
        method: Method,
        options: impl Into<RequestOptions>,
        body: Option<Value>,
    ) -> AnxResult<Response> {
        let mut options = options.into();
        options.method = method;
        if body.is_some() {
            options.body = body;
        }
        self.request(options).await
    }

    /// `GET` a resource.
    ///
    /// # Errors
    ///
    /// See [`AnxApi::request`].
    pub async fn get(&self, options: impl Into<RequestOptions>) -> AnxResult<Response> {
        self.send(Method::Get, options, None).await
    }

    /// `POST` a JSON payload.
    ///
    /// # Errors
    ///
    /// See [`AnxApi::request`].
    pub async fn post(
        &self,
        options: impl Into<RequestOptions>,
        payload: Value,
    ) -> AnxResult<Response> {
        self.send(Method::Post, options, Some(payload)).await
    }

    /// `PUT` a JSON payload.
    ///
    /// # Errors
    ///
    /// See [`AnxApi::request`].
    pub async fn put(
        &self,
        options: impl Into<RequestOptions>,
        payload: Value,
    ) -> AnxResult<Response> {
        self.send(Method::Put, options, Some(payload)).await
    }

    /// `DELETE` a resource.
    ///
    /// # Errors
    ///
    /// See [`AnxApi::request`].
    pub async fn delete(&self, options: impl Into<RequestOptions>) -> AnxResult<Response> {
        self.send(Method::Delete, options, None).await
    }

    /// Fetch every page of a collection and merge them into one response.
    ///
    /// Pages are requested `num_elements` at a time (default `chunk_size`)
    /// until the reported `count` is covered. Each page names its collection
    /// in `dbg_info.output_term`; the items under that key are concatenated
    /// and the per-page `dbg_info.time` values summed.
    ///
    /// # Errors
    ///
    /// Fails on the first page that errors or whose status is not `OK`.
    #[instrument(skip(self, options))]
    pub async fn get_all(&self, options: impl Into<RequestOptions>) -> AnxResult<Response> {
        let mut options = options.into();
        options.method = Method::Get;
        let mut num_elements = options
            .num_elements
            .filter(|n| *n > 0)
            .unwrap_or(self.config.chunk_size);

        let mut start_element = 0;
        let mut output_term: Option<String> = None;
        let mut elements: Vec<Value> = Vec::new();
        let mut dbg_time = 0.0;
        let mut total_time = Duration::ZERO;

        loop {
            let mut page = options.clone();
            page.start_element = Some(start_element);
            page.num_elements = Some(num_elements);
            let res = self.request(page).await?;
            total_time += res.total_time;

            if !status_ok(&res.body) {
                return Err(ApiError::new(ApiErrorKind::Api)
                    .with_status(res.status_code)
                    .with_message(format!(
                        "Page at {start_element} of {} did not report OK",
                        options.uri
                    ))
                    .into());
            }
            let response = &res.body["response"];
            let count = response["count"].as_u64().unwrap_or(0);
            let mut page_dbg = response["dbg_info"].as_object().cloned().unwrap_or_default();
            let Some(term) = page_dbg
                .get("output_term")
                .and_then(Value::as_str)
                .map(str::to_string)
            else {
                return Err(ApiError::new(ApiErrorKind::Api)
                    .with_status(res.status_code)
                    .with_message(format!("{} response has no output_term", options.uri))
                    .into());
            };
            let first_term = output_term.get_or_insert_with(|| term.clone()).clone();

            num_elements = response["num_elements"]
                .as_u64()
                .filter(|n| *n > 0)
                .unwrap_or(num_elements);
            dbg_time += page_dbg.get("time").and_then(Value::as_f64).unwrap_or(0.0);
            match response.get(&term) {
                Some(Value::Array(items)) => elements.extend(items.iter().cloned()),
                Some(Value::Null) | None => {}
                Some(item) => elements.push(item.clone()),
            }
            debug!(start_element, num_elements, count, collected = elements.len(), "Fetched page");

            if count <= start_element + num_elements {
                page_dbg.insert("output_term".to_string(), Value::String(first_term.clone()));
                page_dbg.insert("time".to_string(), json!(dbg_time));

                let mut merged = Map::new();
                merged.insert("count".to_string(), json!(elements.len()));
                merged.insert("start_element".to_string(), json!(0));
                merged.insert("num_elements".to_string(), json!(elements.len()));
                merged.insert("dbg_info".to_string(), Value::Object(page_dbg));
                merged.insert(first_term, Value::Array(elements));

                let mut combined = Response::new(200, json!({ "response": merged }));
                combined.uri = options.uri;
                combined.total_time = total_time;
                return Ok(combined);
            }
            start_element += num_elements;
        }
    }
}

impl std::fmt::Debug for AnxApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnxApi")
            .field("target", &self.config.target)
            .field("limiter", &self.limiter)
            .field("before_request", &self.before_request.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_uri_normalizes_slashes() {
        assert_eq!(join_uri("http://h/", "/user"), "http://h/user");
        assert_eq!(join_uri("http://h", "user"), "http://h/user");
    }

    #[test]
    fn query_string_optionally_encodes() {
        let mut params = BTreeMap::new();
        params.insert("q".to_string(), "a b".to_string());
        params.insert("id".to_string(), "1".to_string());
        assert_eq!(query_string(&params, false), "id=1&q=a b");
        assert_eq!(query_string(&params, true), "id=1&q=a+b");
    }

    #[test]
    fn set_header_replaces_case_insensitively() {
        let mut headers = BTreeMap::new();
        headers.insert("accept".to_string(), "text/plain".to_string());
        set_header(&mut headers, "Accept", "application/json");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers["Accept"], "application/json");
    }
}
