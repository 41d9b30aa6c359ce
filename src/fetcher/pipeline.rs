use crate::fetcher::{
    errors::FetchError,
    types::{Charset, PageResponse},
};
use bytes::Bytes;
use chrono::Utc;
use encoding_rs::Encoding;
use regex::Regex;
use reqwest::StatusCode;
use std::sync::LazyLock;
use tracing::warn;
use url::Url;

static CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).unwrap());

static META_CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<meta\s+[^>]*?charset\s*=\s*["']?([^"'\s/>]+)"#).unwrap());

static META_HTTP_EQUIV_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta\s+[^>]*?http-equiv\s*=\s*["']?content-type["']?[^>]*?content\s*=\s*["']?[^"'>]*?charset\s*=\s*([^"'\s;/>]+)"#).unwrap()
});

const SNIFF_LEN: usize = 4096;

/// Turns a raw HTML body into a `PageResponse` with a UTF-8 body.
pub fn process_response(
    effective_url: Url,
    status: StatusCode,
    content_type: String,
    body_bytes: Bytes,
) -> Result<PageResponse, FetchError> {
    let charset = detect_charset(&content_type, &body_bytes)?;
    let body = decode_to_utf8(&body_bytes, &charset);

    Ok(PageResponse {
        effective_url,
        status,
        content_type,
        body,
        charset,
        fetched_at: Utc::now(),
    })
}

fn detect_charset(content_type: &str, body_bytes: &[u8]) -> Result<Charset, FetchError> {
    // A charset declared by the server must be one we can decode.
    if let Some(label) = CHARSET_REGEX
        .captures(content_type)
        .and_then(|captures| captures.get(1))
    {
        let charset_name = label.as_str().to_lowercase();
        return Encoding::for_label(charset_name.as_bytes())
            .map(Charset::from_encoding)
            .ok_or_else(|| FetchError::Charset(format!("unsupported charset: {}", charset_name)));
    }

    let search_bytes = &body_bytes[..body_bytes.len().min(SNIFF_LEN)];
    let search_str = String::from_utf8_lossy(search_bytes);

    for regex in [&*META_CHARSET_REGEX, &*META_HTTP_EQUIV_REGEX] {
        if let Some(captures) = regex.captures(&search_str)
            && let Some(charset_str) = captures.get(1)
        {
            let charset_name = charset_str.as_str().to_lowercase();
            if let Some(encoding) = Encoding::for_label(charset_name.as_bytes()) {
                return Ok(Charset::from_encoding(encoding));
            }
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(search_bytes, body_bytes.len() <= SNIFF_LEN);
    let detected = detector.guess(None, true);

    Ok(Charset::from_encoding(detected))
}

fn decode_to_utf8(body_bytes: &[u8], charset: &Charset) -> String {
    let encoding = charset.encoding();
    let (decoded, actual, had_errors) = encoding.decode(body_bytes);

    if had_errors {
        warn!(
            "Malformed {} sequences replaced while decoding body",
            actual.name()
        );
    }

    decoded.into_owned()
}
