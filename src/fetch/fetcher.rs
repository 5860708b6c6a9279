//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests, including:
//! - Building the HTTP client with a browser-like header set
//! - Per-request `Host` and `Referer` headers
//! - A per-call deadline and cooperative cancellation
//! - Decoding `gzip`/`deflate` bodies and normalizing the charset

use crate::config::FetchConfig;
use crate::fetch::charset::normalize_to_utf8;
use crate::fetch::{DecodeError, FetchError};
use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CACHE_CONTROL, CONNECTION,
    CONTENT_ENCODING, HOST, REFERER,
};
use reqwest::Client;
use std::io::Read;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Accept header sent with every page request
pub const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// Builds an HTTP client carrying the fixed header set
///
/// The client does not decompress bodies by itself; see [`decode_body`].
///
/// # Example
///
/// ```no_run
/// use readengine::config::FetchConfig;
/// use readengine::fetch::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    if let Ok(language) = HeaderValue::from_str(&config.accept_language) {
        headers.insert(ACCEPT_LANGUAGE, language);
    }

    Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(10))
        .build()
}

/// Retrieves pages and hands them back as UTF-8 text
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    timeout: Duration,
}

impl Fetcher {
    /// Creates a fetcher from the fetch configuration
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = build_http_client(config).map_err(FetchError::Client)?;
        Ok(Self {
            client,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    /// Replaces the per-call deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The per-call deadline
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetches `raw_url` and returns the page as UTF-8 text
    ///
    /// # Request Flow
    ///
    /// 1. Validate the URL (http or https only)
    /// 2. GET with the fixed headers plus `Host` and `Referer`
    /// 3. Race the request against the deadline and `cancel`
    /// 4. Undo `gzip`/`deflate` content encoding
    /// 5. Transcode from the declared `<meta>` charset
    ///
    /// # Errors
    ///
    /// | Condition | Error |
    /// |-----------|-------|
    /// | Deadline exceeded | `FetchError::Timeout` |
    /// | Token cancelled | `FetchError::Cancelled` |
    /// | Non-2xx status | `FetchError::Status` |
    /// | Corrupt body / unknown charset | `FetchError::Decode` |
    pub async fn fetch(&self, raw_url: &str, cancel: &CancellationToken) -> Result<String, FetchError> {
        let url = parse_target(raw_url)?;
        let (content_encoding, body) = self.fetch_raw(&url, cancel).await?;

        let decoded = decode_body(&body, content_encoding.as_deref())?;
        let text = normalize_to_utf8(&decoded)?;

        tracing::debug!(url = %url, bytes = body.len(), "fetched page");
        Ok(text)
    }

    async fn fetch_raw(
        &self,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Result<(Option<String>, Vec<u8>), FetchError> {
        let host = host_header(url);
        let referer = format!("{}://{}", url.scheme(), host);
        let request = self
            .client
            .get(url.clone())
            .header(HOST, host)
            .header(REFERER, referer);

        let work = async {
            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                return Ok(Err(status.as_u16()));
            }

            let content_encoding = response
                .headers()
                .get(CONTENT_ENCODING)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string());
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>(Ok((content_encoding, body.to_vec())))
        };

        let outcome = tokio::select! {
            _ = cancel.cancelled() => {
                return Err(FetchError::Cancelled { url: url.to_string() });
            }
            result = tokio::time::timeout(self.timeout, work) => result,
        };

        match outcome {
            Err(_elapsed) => Err(FetchError::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            }),
            Ok(Err(e)) if e.is_timeout() => Err(FetchError::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            }),
            Ok(Err(e)) => Err(FetchError::Http {
                url: url.to_string(),
                source: e,
            }),
            Ok(Ok(Err(status))) => Err(FetchError::Status {
                url: url.to_string(),
                status,
            }),
            Ok(Ok(Ok(raw))) => Ok(raw),
        }
    }

    /// Checks with a HEAD request whether `url` answers successfully within `timeout`
    ///
    /// Any failure, including the timeout, is reported as `false`.
    pub async fn image_exists(&self, url: &str, timeout: Duration) -> bool {
        let request = self.client.head(url).send();
        match tokio::time::timeout(timeout, request).await {
            Ok(Ok(response)) => response.status().is_success(),
            Ok(Err(e)) => {
                tracing::debug!(url, "image check failed: {}", e);
                false
            }
            Err(_) => {
                tracing::debug!(url, "image check timed out");
                false
            }
        }
    }
}

/// Parses a fetch target, accepting only http and https URLs
pub fn parse_target(raw_url: &str) -> Result<Url, FetchError> {
    let url = Url::parse(raw_url.trim()).map_err(|e| FetchError::InvalidUrl {
        url: raw_url.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        scheme => Err(FetchError::InvalidUrl {
            url: raw_url.to_string(),
            reason: format!("unsupported scheme '{}' or missing host", scheme),
        }),
    }
}

/// `host[:port]` as it should appear in the `Host` header
fn host_header(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

/// Undoes the response `Content-Encoding`
///
/// `gzip` and `deflate` are decoded; `deflate` is tried as zlib first and as
/// a raw stream second, since servers send both. Every other encoding is
/// returned unmodified.
pub fn decode_body(body: &[u8], content_encoding: Option<&str>) -> Result<Vec<u8>, DecodeError> {
    let encoding = content_encoding
        .map(|e| e.trim().to_ascii_lowercase())
        .unwrap_or_default();

    match encoding.as_str() {
        "gzip" => read_all(GzDecoder::new(body), "gzip"),
        "deflate" => {
            read_all(ZlibDecoder::new(body), "deflate").or_else(|_| read_all(DeflateDecoder::new(body), "deflate"))
        }
        _ => Ok(body.to_vec()),
    }
}

fn read_all<R: Read>(mut reader: R, encoding: &str) -> Result<Vec<u8>, DecodeError> {
    let mut out = Vec::new();
    reader
        .read_to_end(&mut out)
        .map_err(|source| DecodeError::Decompress {
            encoding: encoding.to_string(),
            source,
        })?;
    Ok(out)
}
