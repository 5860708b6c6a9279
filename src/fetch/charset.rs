//! Charset detection and transcoding to UTF-8
//!
//! Pages declare their charset in a `<meta>` tag. Only a small set of
//! Chinese encodings is understood besides UTF-8; anything else is rejected
//! rather than guessed.

use crate::fetch::DecodeError;
use encoding_rs::{Encoding, GB18030, GBK};
use regex::bytes::Regex;
use std::sync::OnceLock;

/// Charset assumed when a page declares none
pub const DEFAULT_CHARSET: &str = "utf-8";

fn meta_charset_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)<meta[^>]*?charset\s*=\s*["']?([a-z0-9_-]+)"#)
            .expect("meta charset pattern is valid")
    })
}

/// Finds the charset declared by the first `<meta ... charset=...>` tag
///
/// The match is case-insensitive and the result is lowercased. Returns
/// `None` when the page declares no charset.
///
/// # Example
///
/// ```
/// use readengine::fetch::detect_charset;
///
/// let html = br#"<html><head><META http-equiv="Content-Type" content="text/html; charset=GBK"></head></html>"#;
/// assert_eq!(detect_charset(html), Some("gbk".to_string()));
/// ```
pub fn detect_charset(bytes: &[u8]) -> Option<String> {
    meta_charset_pattern()
        .captures(bytes)
        .and_then(|caps| caps.get(1))
        .map(|m| String::from_utf8_lossy(m.as_bytes()).to_ascii_lowercase())
}

/// Transcodes `bytes` from `charset` into a UTF-8 string
///
/// | Charset | Decoder |
/// |---------|---------|
/// | `utf8`, `utf-8` | UTF-8 (invalid sequences replaced) |
/// | `gbk`, `gb2312` | GBK, a superset of GB2312 |
/// | `hz-gb-2312`, `hz-gb2312` | HZ escapes over GB2312 |
/// | `gb18030` | GB18030 |
///
/// Any other charset fails with `DecodeError::UnsupportedCharset`.
pub fn decode_to_utf8(bytes: &[u8], charset: &str) -> Result<String, DecodeError> {
    match charset.trim().to_ascii_lowercase().as_str() {
        "utf8" | "utf-8" => Ok(String::from_utf8_lossy(bytes).into_owned()),
        "gbk" | "gb2312" => Ok(decode_with(GBK, bytes)),
        "gb18030" => Ok(decode_with(GB18030, bytes)),
        "hz-gb-2312" | "hz-gb2312" => Ok(decode_hz(bytes)),
        other => Err(DecodeError::UnsupportedCharset(other.to_string())),
    }
}

/// Detects the declared charset and transcodes the page to UTF-8
pub fn normalize_to_utf8(bytes: &[u8]) -> Result<String, DecodeError> {
    let charset = detect_charset(bytes).unwrap_or_else(|| DEFAULT_CHARSET.to_string());
    tracing::debug!(charset = %charset, "decoding page");
    decode_to_utf8(bytes, &charset)
}

fn decode_with(encoding: &'static Encoding, bytes: &[u8]) -> String {
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        tracing::debug!("malformed {} sequences replaced", encoding.name());
    }
    text.into_owned()
}

/// Decodes HZ (RFC 1843) by unfolding its 7-bit escapes into GB2312 bytes
///
/// `~{` enters GB mode, `~}` leaves it, `~~` is a literal tilde and `~`
/// followed by a newline is a line continuation.
fn decode_hz(bytes: &[u8]) -> String {
    let mut gb = Vec::with_capacity(bytes.len());
    let mut wide = false;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];

        if b == b'~' && i + 1 < bytes.len() {
            match bytes[i + 1] {
                b'{' => {
                    wide = true;
                    i += 2;
                    continue;
                }
                b'}' => {
                    wide = false;
                    i += 2;
                    continue;
                }
                b'~' => {
                    gb.push(b'~');
                    i += 2;
                    continue;
                }
                b'\n' => {
                    i += 2;
                    continue;
                }
                _ => {}
            }
        }

        if wide && i + 1 < bytes.len() && is_hz_byte(b) && is_hz_byte(bytes[i + 1]) {
            gb.push(b | 0x80);
            gb.push(bytes[i + 1] | 0x80);
            i += 2;
            continue;
        }

        gb.push(b);
        i += 1;
    }

    decode_with(GBK, &gb)
}

fn is_hz_byte(b: u8) -> bool {
    (0x21..=0x7e).contains(&b)
}
