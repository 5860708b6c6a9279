//! Fetch module: retrieves pages over HTTP(S) and normalizes them to UTF-8
//!
//! This module contains:
//! - The HTTP fetcher with a fixed browser-like header set
//! - Content-Encoding decoding (gzip, deflate)
//! - `<meta>` charset detection and transcoding

mod charset;
mod fetcher;

pub use charset::{decode_to_utf8, detect_charset, normalize_to_utf8, DEFAULT_CHARSET};
pub use fetcher::{build_http_client, decode_body, parse_target, Fetcher, ACCEPT_HTML};

use std::time::Duration;
use thiserror::Error;

/// Errors raised while retrieving a page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(reqwest::Error),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url} after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("Request cancelled for {url}")]
    Cancelled { url: String },

    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Errors raised while turning a response body into UTF-8 text
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Unsupported charset: {0}")]
    UnsupportedCharset(String),

    #[error("Malformed {encoding} stream: {source}")]
    Decompress {
        encoding: String,
        source: std::io::Error,
    },
}

impl FetchError {
    /// Returns true if the request ran out of time
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
