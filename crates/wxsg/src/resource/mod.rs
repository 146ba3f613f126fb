// ABOUTME: Transport for wxsg: one HTTP GET per call, a body size cap, and charset-aware decoding.
// ABOUTME: Failures are returned as Fetch errors carrying the requested url; nothing is retried.

use std::collections::HashMap;

use bytes::Bytes;
use encoding_rs::Encoding;
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use tracing::debug;
use url::Url;

use crate::error::{Result, WxsgError};

/// Largest body accepted from either site (10 MiB).
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// How far into a body a `<meta>` charset declaration is looked for.
const META_PRESCAN_BYTES: usize = 1024;

static META_CHARSET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta[^>]*?charset\s*=\s*["']?([A-Za-z0-9_.:-]+)"#)
        .expect("valid meta charset regex")
});

/// A page that came back with status 200.
#[derive(Debug, Clone)]
pub struct Page {
    /// Url that was requested.
    pub url: String,
    /// Url after redirects.
    pub final_url: String,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl Page {
    /// Decode the body to text with [`decode`].
    pub fn text(&self) -> String {
        decode(&self.body, self.content_type.as_deref(), &self.final_url)
    }
}

/// Decode a page body to text.
///
/// The `charset` of `content_type` wins when it names a known encoding, then a
/// `<meta>` declaration near the top of the body. Otherwise the encoding is
/// sniffed, hinted by the top-level domain of `url` (search pages were
/// historically served as GBK). Saved pages pass no content type and may pass
/// an empty url.
pub fn decode(body: &[u8], content_type: Option<&str>, url: &str) -> String {
    let encoding = content_type
        .and_then(declared_charset)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .or_else(|| meta_charset(body))
        .unwrap_or_else(|| sniff(body, top_level_domain(url).as_deref()));
    let (text, _, _) = encoding.decode(body);
    text.into_owned()
}

fn meta_charset(body: &[u8]) -> Option<&'static Encoding> {
    let head = &body[..body.len().min(META_PRESCAN_BYTES)];
    let label = META_CHARSET_RE.captures(head)?.get(1)?;
    Encoding::for_label(label.as_bytes())
}

fn declared_charset(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        Some(value.trim().trim_matches(|c| c == '"' || c == '\'').to_ascii_lowercase())
    })
}

fn sniff(body: &[u8], tld: Option<&str>) -> &'static Encoding {
    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    detector.guess(tld.map(str::as_bytes), true)
}

fn top_level_domain(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    host.rsplit('.').next().map(str::to_string)
}

fn too_large(url: &str, size: u64) -> WxsgError {
    WxsgError::fetch(
        url,
        "Fetch",
        Some(anyhow::anyhow!(
            "body of {} bytes exceeds the {} byte limit",
            size,
            MAX_BODY_BYTES
        )),
    )
}

/// GET `url` once, sending `headers` on top of the client defaults.
///
/// Any status other than 200 is a Fetch error, as is a body over
/// [`MAX_BODY_BYTES`] whether announced by content-length or observed.
pub async fn fetch(
    client: &reqwest::Client,
    url: &str,
    headers: &HashMap<String, String>,
) -> Result<Page> {
    let request = headers
        .iter()
        .fold(client.get(url), |req, (name, value)| req.header(name, value));

    debug!(url, "GET");
    let response = request.send().await.map_err(|e| {
        WxsgError::fetch(url, "Fetch", Some(anyhow::anyhow!("request failed: {}", e)))
    })?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(WxsgError::fetch(
            url,
            "Fetch",
            Some(anyhow::anyhow!("HTTP status {}", status.as_u16())),
        ));
    }
    if let Some(announced) = response.content_length() {
        if announced > MAX_BODY_BYTES as u64 {
            return Err(too_large(url, announced));
        }
    }

    let final_url = response.url().to_string();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.bytes().await.map_err(|e| {
        WxsgError::fetch(
            url,
            "Fetch",
            Some(anyhow::anyhow!("failed to read body: {}", e)),
        )
    })?;
    if body.len() > MAX_BODY_BYTES {
        return Err(too_large(url, body.len() as u64));
    }

    debug!(url, final_url = %final_url, bytes = body.len(), "fetched");
    Ok(Page {
        url: url.to_string(),
        final_url,
        content_type,
        body,
    })
}
