// ABOUTME: The wxsg Client: search, article, redirect and album operations over one HTTP client.
// ABOUTME: Every operation is fetch once, decode, parse, build; failures surface without retry.

use tracing::{debug, warn};
use url::Url;

use crate::builders::{self, album_from_html, article_from_html};
use crate::error::{Result, WxsgError};
use crate::options::{ClientBuilder, Options};
use crate::records::{AccountRecord, AlbumRecord, ArticleRecord, ArticleSearchRecord};
use crate::redirect;
use crate::resource::{fetch, Page};

/// What a search request asks the engine for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Accounts,
    Articles,
}

impl SearchKind {
    fn type_param(self) -> &'static str {
        match self {
            SearchKind::Accounts => "1",
            SearchKind::Articles => "2",
        }
    }
}

/// Client for the Sogou WeChat search engine and WeChat article pages.
///
/// Holds one `reqwest::Client` with a cookie store; the search engine hands out
/// the cookies its redirect links need, so reuse one Client across calls.
#[derive(Debug, Clone)]
pub struct Client {
    opts: Options,
    http_client: reqwest::Client,
    search_base: Url,
}

impl Client {
    /// Create a new ClientBuilder for configuring the client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a new Client with the given options.
    pub fn new(mut opts: Options) -> Result<Self> {
        opts.search_base = opts.search_base.trim_end_matches('/').to_string();
        opts.mp_base = opts.mp_base.trim_end_matches('/').to_string();
        let search_base = parse_base(&opts.search_base)?;
        parse_base(&opts.mp_base)?;

        let http_client = match opts.http_client.clone() {
            Some(client) => client,
            None => reqwest::Client::builder()
                .user_agent(&opts.user_agent)
                .timeout(opts.timeout)
                .cookie_store(true)
                .gzip(true)
                .brotli(true)
                .deflate(true)
                .build()
                .map_err(|e| {
                    WxsgError::fetch(
                        "",
                        "NewClient",
                        Some(anyhow::anyhow!("failed to build HTTP client: {}", e)),
                    )
                })?,
        };

        Ok(Self {
            opts,
            http_client,
            search_base,
        })
    }

    /// The options this client was built with.
    pub fn options(&self) -> &Options {
        &self.opts
    }

    /// Search official accounts. Pages start at 1; smaller values mean page 1.
    pub async fn search_accounts(&self, query: &str, page: i32) -> Result<Vec<AccountRecord>> {
        let url = self.search_url(SearchKind::Accounts, query, page)?;
        let res = self.get(&url).await?;
        let doc = builders::parse_document(&res.text(), "SearchAccounts")
            .map_err(|e| e.with_url(&url))?;
        builders::build_accounts(&doc, &self.search_base).map_err(|e| e.with_url(&url))
    }

    /// Search articles. Pages start at 1; smaller values mean page 1.
    pub async fn search_articles(
        &self,
        query: &str,
        page: i32,
    ) -> Result<Vec<ArticleSearchRecord>> {
        let url = self.search_url(SearchKind::Articles, query, page)?;
        let res = self.get(&url).await?;
        let doc = builders::parse_document(&res.text(), "SearchArticles")
            .map_err(|e| e.with_url(&url))?;
        builders::build_article_results(&doc, &self.search_base).map_err(|e| e.with_url(&url))
    }

    /// Follow a search-engine `/link` url to the article url hidden in its decoy page.
    ///
    /// Returns an empty string when the decoy page holds no url fragments.
    pub async fn resolve_article_url(&self, url: &str) -> Result<String> {
        let res = self.get(url).await?;
        redirect::reconstruct(&res.body).map_err(|e| e.with_url(url))
    }

    /// Fetch an article by url.
    ///
    /// Accepts a search-engine `/link` url (resolved first) or a direct
    /// article url on the content site. Anything else is an UnexpectedDocument error.
    pub async fn article_by_url(&self, url: &str) -> Result<ArticleRecord> {
        let target = if self.is_search_link(url) {
            let resolved = self.resolve_article_url(url).await?;
            if resolved.is_empty() {
                warn!(url, "redirect page resolved to an empty url");
                return Err(WxsgError::unexpected_document(
                    url,
                    "ArticleByUrl",
                    Some(anyhow::anyhow!("redirect page holds no url fragments")),
                ));
            }
            debug!(from = url, to = %resolved, "resolved search link");
            resolved
        } else if self.is_article_url(url) {
            url.to_string()
        } else {
            return Err(WxsgError::unexpected_document(
                url,
                "ArticleByUrl",
                Some(anyhow::anyhow!("invalid url")),
            ));
        };

        let res = self.get(&target).await?;
        article_from_html(&res.text(), &res.final_url)
    }

    /// Search for `title` and fetch the first result whose title matches exactly.
    ///
    /// When `account` is given, the result's account name must match too.
    pub async fn article_by_title(
        &self,
        title: &str,
        account: Option<&str>,
    ) -> Result<ArticleRecord> {
        let results = self.search_articles(title, 1).await?;
        let hit = results
            .iter()
            .filter(|r| r.title == title)
            .find(|r| account.map_or(true, |name| r.account_name == name));
        match hit {
            Some(hit) => {
                debug!(title, url = %hit.url, "matched article search result");
                self.article_by_url(&hit.url).await
            }
            None => Err(WxsgError::not_found(
                "",
                "ArticleByTitle",
                Some(anyhow::anyhow!("no article titled {:?}", title)),
            )),
        }
    }

    /// Search for account `name` and fetch its latest article.
    ///
    /// Takes the first account whose name matches exactly (and whose weixin
    /// id matches, when given) that lists a latest article.
    pub async fn latest_article_by_account(
        &self,
        name: &str,
        weixin_id: Option<&str>,
    ) -> Result<ArticleRecord> {
        let accounts = self.search_accounts(name, 1).await?;
        let latest = accounts
            .iter()
            .filter(|a| a.name == name)
            .filter(|a| weixin_id.map_or(true, |id| a.weixin_id == id))
            .find_map(|a| a.latest_article.as_ref());
        match latest {
            Some(latest) => {
                debug!(account = name, url = %latest.url, "matched account latest article");
                self.article_by_url(&latest.url).await
            }
            None => Err(WxsgError::not_found(
                "",
                "LatestArticleByAccount",
                Some(anyhow::anyhow!("no account named {:?} with a latest article", name)),
            )),
        }
    }

    /// Fetch a topic page. `reverse` asks the server for oldest-first order.
    pub async fn album_by_url(&self, url: &str, reverse: bool) -> Result<AlbumRecord> {
        let mut target = Url::parse(url).map_err(|e| {
            WxsgError::unexpected_document(url, "AlbumByUrl", Some(anyhow::anyhow!("invalid url: {}", e)))
        })?;
        if reverse {
            target.query_pairs_mut().append_pair("is_reverse", "1");
        }
        let target = target.to_string();
        let res = self.get(&target).await?;
        album_from_html(&res.text()).map_err(|e| e.with_url(&target))
    }

    /// Fetch a topic page by its album id.
    pub async fn album_by_id(&self, id: &str, reverse: bool) -> Result<AlbumRecord> {
        let url = self.album_url(id)?;
        self.album_by_url(&url, reverse).await
    }

    async fn get(&self, url: &str) -> Result<Page> {
        fetch(&self.http_client, url, &self.opts.headers).await
    }

    fn search_url(&self, kind: SearchKind, query: &str, page: i32) -> Result<String> {
        let page = page.max(1).to_string();
        let endpoint = format!("{}/weixin", self.opts.search_base);
        Url::parse_with_params(
            &endpoint,
            &[
                ("ie", "utf8"),
                ("type", kind.type_param()),
                ("page", page.as_str()),
                ("query", query),
            ],
        )
        .map(String::from)
        .map_err(|e| {
            WxsgError::unexpected_document(
                endpoint.as_str(),
                "SearchUrl",
                Some(anyhow::anyhow!("invalid search url: {}", e)),
            )
        })
    }

    fn album_url(&self, id: &str) -> Result<String> {
        let endpoint = format!("{}/mp/appmsgalbum", self.opts.mp_base);
        Url::parse_with_params(&endpoint, &[("action", "getalbum"), ("album_id", id)])
            .map(String::from)
            .map_err(|e| {
                WxsgError::unexpected_document(
                    endpoint.as_str(),
                    "AlbumUrl",
                    Some(anyhow::anyhow!("invalid album url: {}", e)),
                )
            })
    }

    fn is_search_link(&self, url: &str) -> bool {
        url.contains(&format!("{}/link", without_scheme(&self.opts.search_base)))
    }

    fn is_article_url(&self, url: &str) -> bool {
        url.contains(&format!("{}/s", without_scheme(&self.opts.mp_base)))
    }
}

fn parse_base(base: &str) -> Result<Url> {
    Url::parse(base).map_err(|e| {
        WxsgError::unexpected_document(
            base,
            "NewClient",
            Some(anyhow::anyhow!("invalid base url: {}", e)),
        )
    })
}

fn without_scheme(base: &str) -> &str {
    base.split_once("://").map_or(base, |(_, rest)| rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> Client {
        Client::builder().build().unwrap()
    }

    #[test]
    fn search_url_has_fixed_parameter_order() {
        let c = client();
        assert_eq!(
            c.search_url(SearchKind::Accounts, "rust lang", 2).unwrap(),
            "https://weixin.sogou.com/weixin?ie=utf8&type=1&page=2&query=rust+lang"
        );
        assert_eq!(
            c.search_url(SearchKind::Articles, "x", 1).unwrap(),
            "https://weixin.sogou.com/weixin?ie=utf8&type=2&page=1&query=x"
        );
    }

    #[test]
    fn page_below_one_is_clamped() {
        let c = client();
        assert!(c
            .search_url(SearchKind::Accounts, "x", 0)
            .unwrap()
            .contains("&page=1&"));
        assert!(c
            .search_url(SearchKind::Articles, "x", -3)
            .unwrap()
            .contains("&page=1&"));
    }

    #[test]
    fn album_url_uses_mp_base() {
        assert_eq!(
            client().album_url("2036709839434842113").unwrap(),
            "https://mp.weixin.qq.com/mp/appmsgalbum?action=getalbum&album_id=2036709839434842113"
        );
    }

    #[test]
    fn url_recognition() {
        let c = client();
        assert!(c.is_search_link("https://weixin.sogou.com/link?url=abc&type=2"));
        assert!(c.is_search_link("http://weixin.sogou.com/link?url=abc"));
        assert!(!c.is_search_link("https://mp.weixin.qq.com/s/abc"));
        assert!(c.is_article_url("https://mp.weixin.qq.com/s/qgr3OR5Xha8MWMMv0mV7_A"));
        assert!(c.is_article_url("http://mp.weixin.qq.com/s?__biz=MzU&mid=1"));
        assert!(!c.is_article_url("https://mp.weixin.qq.com/mp/appmsgalbum?album_id=1"));
        assert!(!c.is_article_url("https://example.com/s/abc"));
    }

    #[test]
    fn invalid_base_is_rejected() {
        let err = Client::builder().search_base("not a url").build().unwrap_err();
        assert!(err.is_unexpected_document());
    }

    #[tokio::test]
    async fn unknown_article_url_is_unexpected_document() {
        let err = client()
            .article_by_url("https://example.com/post/1")
            .await
            .unwrap_err();
        assert!(err.is_unexpected_document());
        assert_eq!(err.url, "https://example.com/post/1");
    }

    #[tokio::test]
    async fn malformed_album_url_is_unexpected_document() {
        let err = client().album_by_url("::nope", false).await.unwrap_err();
        assert!(err.is_unexpected_document());
    }

    #[test]
    fn client_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Client>();
    }
}
