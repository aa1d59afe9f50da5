//! HTTP transport backed by reqwest.

use anx_core::{Method, RequestOptions, Response, Transport};
use anx_error::{AnxError, AnxResult, HttpError, NetworkError, NetworkErrorKind};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::BTreeMap;
use tokio::time::Instant;
use tracing::{debug, instrument};

/// Sends fully prepared requests over HTTP.
///
/// Every status code comes back as a [`Response`]; only failures to get a
/// response at all are errors here. Classification happens further up.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with its own connection pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new() -> AnxResult<Self> {
        let client = Client::builder()
            .gzip(true)
            .build()
            .map_err(|e| HttpError::new(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(client))
    }

    /// Wrap an existing reqwest client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
        Method::Head => reqwest::Method::HEAD,
        Method::Options => reqwest::Method::OPTIONS,
    }
}

/// First `std::io::Error` in the source chain, if any.
fn io_error_kind(err: &reqwest::Error) -> Option<std::io::ErrorKind> {
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        if let Some(io) = inner.downcast_ref::<std::io::Error>() {
            return Some(io.kind());
        }
        source = inner.source();
    }
    None
}

/// Map a reqwest failure onto the network error taxonomy.
fn network_error(err: &reqwest::Error, uri: &str) -> AnxError {
    let message = err.to_string().to_lowercase();
    let io_kind = io_error_kind(err)
        .map(NetworkErrorKind::from_io_kind)
        .filter(|kind| *kind != NetworkErrorKind::Other);
    let kind = if err.is_timeout() {
        NetworkErrorKind::SocketTimeout
    } else if let Some(kind) = io_kind {
        kind
    } else if err.is_connect() {
        if message.contains("dns") || message.contains("resolve") {
            NetworkErrorKind::DnsLookup
        } else if message.contains("timed out") {
            NetworkErrorKind::ConnectionTimeout
        } else {
            NetworkErrorKind::ConnectionRefused
        }
    } else if message.contains("reset") {
        NetworkErrorKind::ConnectionReset
    } else if message.contains("aborted") {
        NetworkErrorKind::ConnectionAborted
    } else {
        NetworkErrorKind::Other
    };
    NetworkError::new(kind, format!("{uri}: {err}")).into()
}

/// Decode a body as JSON, falling back to a string, or `Null` when empty.
pub(crate) fn decode_body(bytes: &[u8]) -> serde_json::Value {
    if bytes.is_empty() {
        return serde_json::Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| serde_json::Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[instrument(skip(self, options), fields(method = %options.method, uri = %options.uri))]
    async fn request(&self, options: RequestOptions) -> AnxResult<Response> {
        let mut request = self
            .client
            .request(reqwest_method(options.method), &options.uri);
        for (name, value) in &options.headers {
            request = request.header(name, value);
        }
        if let Some(timeout) = options.timeout {
            request = request.timeout(timeout);
        }
        request = match &options.body {
            Some(serde_json::Value::String(raw)) => request.body(raw.clone()),
            Some(body) => request.body(body.to_string()),
            None => request,
        };

        let started = Instant::now();
        let response = request
            .send()
            .await
            .map_err(|e| network_error(&e, &options.uri))?;
        let status_code = response.status().as_u16();
        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| network_error(&e, &options.uri))?;
        let request_time = started.elapsed();
        debug!(status = status_code, elapsed_ms = request_time.as_millis() as u64, "Received response");

        Ok(Response {
            uri: options.uri,
            status_code,
            headers,
            body: decode_body(&bytes),
            request_time,
            total_time: request_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_json_body() {
        assert_eq!(decode_body(br#"{"a":1}"#), json!({ "a": 1 }));
    }

    #[test]
    fn decode_text_body() {
        assert_eq!(decode_body(b"plain"), json!("plain"));
    }

    #[test]
    fn decode_empty_body() {
        assert_eq!(decode_body(b""), serde_json::Value::Null);
    }

    #[test]
    fn methods_map_one_to_one() {
        assert_eq!(reqwest_method(Method::Delete), reqwest::Method::DELETE);
        assert_eq!(reqwest_method(Method::Get), reqwest::Method::GET);
    }
}
