// ABOUTME: Configuration for the wxsg client: Options value and the fluent ClientBuilder.
// ABOUTME: Options are built once and never mutated by the client afterwards.

use std::collections::HashMap;
use std::time::Duration;

use crate::client::Client;

/// Desktop Edge user agent; the search engine serves the layout the builders expect to it.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/98.0.4758.102 Safari/537.36 Edg/98.0.1108.62";

/// Origin of the Sogou WeChat search engine.
pub const DEFAULT_SEARCH_BASE: &str = "https://weixin.sogou.com";

/// Origin of the WeChat official-account content site.
pub const DEFAULT_MP_BASE: &str = "https://mp.weixin.qq.com";

/// Configuration options for the wxsg client.
#[derive(Debug, Clone)]
pub struct Options {
    pub timeout: Duration,
    pub user_agent: String,
    pub headers: HashMap<String, String>,
    /// Origin used for search requests and for absolutizing search-result links.
    pub search_base: String,
    /// Origin used for album-by-id requests and for recognizing direct article urls.
    pub mp_base: String,
    pub http_client: Option<reqwest::Client>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headers: HashMap::new(),
            search_base: DEFAULT_SEARCH_BASE.to_string(),
            mp_base: DEFAULT_MP_BASE.to_string(),
            http_client: None,
        }
    }
}

/// Builder for constructing Client instances with custom configuration.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    opts: Options,
}

impl ClientBuilder {
    /// Create a new ClientBuilder with default options.
    pub fn new() -> Self {
        Self {
            opts: Options::default(),
        }
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.opts.user_agent = user_agent.into();
        self
    }

    /// Add a custom header to all requests.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.opts.headers.insert(key.into(), value.into());
        self
    }

    /// Point search requests at another origin (mirrors, test servers).
    pub fn search_base(mut self, base: impl Into<String>) -> Self {
        self.opts.search_base = trim_base(base.into());
        self
    }

    /// Point content-site requests at another origin.
    pub fn mp_base(mut self, base: impl Into<String>) -> Self {
        self.opts.mp_base = trim_base(base.into());
        self
    }

    /// Use a custom HTTP client. Its own cookie and user-agent settings apply.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.opts.http_client = Some(client);
        self
    }

    /// Build the Client with the configured options.
    pub fn build(self) -> crate::Result<Client> {
        Client::new(self.opts)
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn trim_base(base: String) -> String {
    base.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_public_sites() {
        let opts = Options::default();
        assert_eq!(opts.search_base, "https://weixin.sogou.com");
        assert_eq!(opts.mp_base, "https://mp.weixin.qq.com");
        assert_eq!(opts.timeout, Duration::from_secs(30));
        assert!(opts.user_agent.starts_with("Mozilla/5.0"));
    }

    #[test]
    fn builder_trims_trailing_slash_on_bases() {
        let b = ClientBuilder::new()
            .search_base("http://127.0.0.1:9000/")
            .mp_base("http://127.0.0.1:9001//");
        assert_eq!(b.opts.search_base, "http://127.0.0.1:9000");
        assert_eq!(b.opts.mp_base, "http://127.0.0.1:9001");
    }

    #[test]
    fn builder_collects_headers() {
        let b = ClientBuilder::new()
            .header("Referer", "https://weixin.sogou.com/")
            .user_agent("test-agent");
        assert_eq!(
            b.opts.headers.get("Referer").map(String::as_str),
            Some("https://weixin.sogou.com/")
        );
        assert_eq!(b.opts.user_agent, "test-agent");
    }
}
