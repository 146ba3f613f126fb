// ABOUTME: Record builders: pure functions from a parsed page to account, article and album records.
// ABOUTME: Also hosts the shared parse entry point and link absolutizing used by every builder.

//! Record builders.
//!
//! Builders never perform I/O. Each one reads a fixed page layout through the
//! [`crate::query`] helpers and the [`crate::patterns`] extractors:
//! - `search`: account and article result lists from the search engine.
//! - `article`: a single article page.
//! - `album`: a topic page.
//!
//! Missing single fields fall back to empty or `None`; only list-level and
//! document-level problems become errors.

pub mod album;
pub mod article;
pub mod search;

use scraper::Html;
use url::Url;

use crate::error::{Result, WxsgError};

pub use album::{album_from_html, build_album};
pub use article::{article_from_html, build_article};
pub use search::{
    accounts_from_html, article_results_from_html, build_accounts, build_article_results,
};

/// Parse a fetched body into a document. A blank body is a Parse error.
pub fn parse_document(html: &str, op: &str) -> Result<Html> {
    if html.trim().is_empty() {
        return Err(WxsgError::parse(
            "",
            op,
            Some(anyhow::anyhow!("empty document")),
        ));
    }
    Ok(Html::parse_document(html))
}

/// Resolve a link found on a page against `base`.
///
/// Handles site-relative (`/link?...`) and protocol-relative (`//img...`)
/// values. A value that cannot be joined is returned unchanged.
pub(crate) fn absolutize(base: &Url, raw: &str) -> String {
    base.join(raw)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolutize_handles_relative_forms() {
        let base = Url::parse("https://weixin.sogou.com").unwrap();
        assert_eq!(
            absolutize(&base, "/link?url=abc&type=1"),
            "https://weixin.sogou.com/link?url=abc&type=1"
        );
        assert_eq!(
            absolutize(&base, "//img01.sogoucdn.com/app/a/100520090/oIWsFt.jpg"),
            "https://img01.sogoucdn.com/app/a/100520090/oIWsFt.jpg"
        );
        assert_eq!(
            absolutize(&base, "https://mp.weixin.qq.com/s/abc"),
            "https://mp.weixin.qq.com/s/abc"
        );
    }

    #[test]
    fn blank_document_is_parse_error() {
        let err = parse_document("  \n", "ParseArticle").unwrap_err();
        assert!(err.is_parse());
        assert!(parse_document("<html></html>", "ParseArticle").is_ok());
    }
}
