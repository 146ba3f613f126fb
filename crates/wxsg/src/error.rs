// ABOUTME: Error types for wxsg including the ErrorCode enum and the WxsgError struct.
// ABOUTME: Provides categorized errors with convenience constructors and boolean helpers.

use std::fmt;

/// Error codes representing the categories of failure a call can surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Network, non-200 status or body read failure in the fetch step.
    Fetch,
    /// The fetched body could not be turned into a document.
    Parse,
    /// A result list that must be non-empty had no entries.
    EmptyResult,
    /// The page or url does not have the shape this crate knows how to read.
    UnexpectedDocument,
    /// A lookup by title or account name matched no search result.
    NotFound,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::Fetch => "fetch error",
            ErrorCode::Parse => "parse error",
            ErrorCode::EmptyResult => "no results",
            ErrorCode::UnexpectedDocument => "unexpected document",
            ErrorCode::NotFound => "not found",
        };
        write!(f, "{}", s)
    }
}

/// The error type returned by every fallible wxsg operation.
#[derive(Debug, thiserror::Error)]
pub struct WxsgError {
    pub code: ErrorCode,
    pub url: String,
    pub op: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for WxsgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wxsg: {}", self.op)?;
        if !self.url.is_empty() {
            write!(f, " {}", self.url)?;
        }
        write!(f, ": {}", self.code)?;
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        Ok(())
    }
}

impl WxsgError {
    fn new(
        code: ErrorCode,
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code,
            url: url.into(),
            op: op.into(),
            source,
        }
    }

    /// Create a Fetch error.
    pub fn fetch(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::Fetch, url, op, source)
    }

    /// Create a Parse error.
    pub fn parse(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::Parse, url, op, source)
    }

    /// Create an EmptyResult error.
    pub fn empty_result(url: impl Into<String>, op: impl Into<String>) -> Self {
        Self::new(ErrorCode::EmptyResult, url, op, None)
    }

    /// Create an UnexpectedDocument error.
    pub fn unexpected_document(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::UnexpectedDocument, url, op, source)
    }

    /// Create a NotFound error.
    pub fn not_found(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::NotFound, url, op, source)
    }

    /// Attach the url of the call that failed, keeping any url already set.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        if self.url.is_empty() {
            self.url = url.into();
        }
        self
    }

    /// Returns true if this is a Fetch error.
    pub fn is_fetch(&self) -> bool {
        self.code == ErrorCode::Fetch
    }

    /// Returns true if this is a Parse error.
    pub fn is_parse(&self) -> bool {
        self.code == ErrorCode::Parse
    }

    /// Returns true if this is an EmptyResult error.
    pub fn is_empty_result(&self) -> bool {
        self.code == ErrorCode::EmptyResult
    }

    /// Returns true if this is an UnexpectedDocument error.
    pub fn is_unexpected_document(&self) -> bool {
        self.code == ErrorCode::UnexpectedDocument
    }

    /// Returns true if this is a NotFound error.
    pub fn is_not_found(&self) -> bool {
        self.code == ErrorCode::NotFound
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, WxsgError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_op_url_code_and_source() {
        let err = WxsgError::fetch(
            "https://weixin.sogou.com/weixin",
            "SearchAccounts",
            Some(anyhow::anyhow!("HTTP status 502")),
        );
        assert_eq!(
            err.to_string(),
            "wxsg: SearchAccounts https://weixin.sogou.com/weixin: fetch error: HTTP status 502"
        );
    }

    #[test]
    fn display_skips_empty_url() {
        let err = WxsgError::unexpected_document("", "Reconstruct", None);
        assert_eq!(err.to_string(), "wxsg: Reconstruct: unexpected document");
    }

    #[test]
    fn with_url_fills_only_missing_url() {
        let err = WxsgError::empty_result("", "BuildAccounts").with_url("https://a");
        assert_eq!(err.url, "https://a");
        let err = err.with_url("https://b");
        assert_eq!(err.url, "https://a");
    }

    #[test]
    fn helpers_match_codes() {
        assert!(WxsgError::fetch("", "op", None).is_fetch());
        assert!(WxsgError::parse("", "op", None).is_parse());
        assert!(WxsgError::empty_result("", "op").is_empty_result());
        assert!(WxsgError::unexpected_document("", "op", None).is_unexpected_document());
        assert!(WxsgError::not_found("", "op", None).is_not_found());
        assert!(!WxsgError::not_found("", "op", None).is_fetch());
    }
}
