// ABOUTME: Rebuilds the real article url hidden in a search-engine decoy page.
// ABOUTME: The page assembles the url from `url += '...';` fragments salted with '@' characters.

use once_cell::sync::Lazy;
use regex::bytes::Regex;
use tracing::{debug, warn};

use crate::error::{Result, WxsgError};

/// Literal that marks a page as the known decoy layout.
pub const DECOY_GUARD: &str = r#"url.replace("@", "")"#;

static GUARD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&regex::escape(DECOY_GUARD)).expect("valid decoy guard regex")
});

static FRAGMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"url \+= '(.*?)';").expect("valid url fragment regex"));

/// Reconstruct the destination url from the raw bytes of a decoy page.
///
/// Fails with `UnexpectedDocument` when the guard literal is missing, whether or
/// not fragment instructions are present. A page with the guard and no
/// fragments yields an empty string.
pub fn reconstruct(page: &[u8]) -> Result<String> {
    if !GUARD_RE.is_match(page) {
        warn!("decoy page guard missing; obfuscation scheme may have changed");
        return Err(WxsgError::unexpected_document(
            "",
            "Reconstruct",
            Some(anyhow::anyhow!("decoy page guard not found")),
        ));
    }

    let mut joined = Vec::new();
    let mut fragments = 0usize;
    for caps in FRAGMENT_RE.captures_iter(page) {
        if let Some(m) = caps.get(1) {
            joined.extend_from_slice(m.as_bytes());
            fragments += 1;
        }
    }

    if fragments == 0 {
        warn!("decoy page has the guard but no url fragments");
    }

    let url = String::from_utf8_lossy(&joined).replace('@', "");
    debug!(fragments, url = %url, "reconstructed redirect url");
    Ok(url)
}
