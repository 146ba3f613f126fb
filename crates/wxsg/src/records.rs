// ABOUTME: Record types produced by the builders: accounts, search hits, articles, topics and albums.
// ABOUTME: Records are owned snapshots; a missing publish time is None rather than an error.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content::{flatten, ContentNode};

/// Title used for album entries that carry no `data-title` attribute.
pub const TITLE_PLACEHOLDER: &str = "TITLE NOT FOUND";

/// One official account from an account search.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AccountRecord {
    pub name: String,
    /// Absolute profile link on the search engine.
    pub url: String,
    pub avatar: String,
    pub qr_code: String,
    pub weixin_id: String,
    pub introduction: String,
    /// Verification label, e.g. the certifying organisation.
    pub verification: Option<String>,
    pub latest_article: Option<LatestArticle>,
}

/// The "latest article" side panel of an account search hit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LatestArticle {
    pub title: String,
    pub url: String,
    pub pub_time: Option<DateTime<Utc>>,
}

/// One article from an article search.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArticleSearchRecord {
    pub title: String,
    pub url: String,
    pub preview: String,
    pub account_name: String,
    pub account_url: String,
    pub pub_time: Option<DateTime<Utc>>,
    pub image: Option<String>,
}

/// A topic (album) an article is filed under.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TopicRef {
    pub id: String,
    pub name: String,
    /// Member-count label as shown on the page; not parsed.
    pub count: String,
    pub url: String,
}

/// A fetched article page.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub title: String,
    pub author: String,
    pub account_name: String,
    pub pub_time: Option<DateTime<Utc>>,
    pub url: String,
    pub topics: Vec<TopicRef>,
    /// Owned copy of the article body tree, flattened on demand by [`ArticleRecord::content`].
    #[serde(skip)]
    pub body: Option<ContentNode>,
}

impl ArticleRecord {
    /// Plain-text rendering of the article body: text, `[img ...]` markers and paragraph breaks.
    ///
    /// Returns an empty string when the page had no body container.
    pub fn content(&self) -> String {
        self.body.as_ref().map(flatten).unwrap_or_default()
    }
}

impl fmt::Display for ArticleRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        let time = self
            .pub_time
            .map(|t| t.to_rfc3339())
            .unwrap_or_default();
        writeln!(f, "{} {} {}", self.author, self.account_name, time)?;
        write!(f, "{}", self.content())
    }
}

/// A topic page listing the articles filed under it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AlbumRecord {
    pub name: String,
    pub account_name: String,
    pub count: String,
    /// Entries in the order the server returned them.
    pub articles: Vec<AlbumArticleRef>,
}

/// One entry of an album listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlbumArticleRef {
    /// 1-based position, or -1 when the page did not provide a usable one.
    pub index: i32,
    pub title: String,
    pub url: String,
    pub pub_time: Option<DateTime<Utc>>,
    pub image: Option<String>,
}

impl Default for AlbumArticleRef {
    fn default() -> Self {
        Self {
            index: -1,
            title: TITLE_PLACEHOLDER.to_string(),
            url: String::new(),
            pub_time: None,
            image: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn album_article_default_uses_sentinels() {
        let a = AlbumArticleRef::default();
        assert_eq!(a.index, -1);
        assert_eq!(a.title, TITLE_PLACEHOLDER);
        assert_eq!(a.pub_time, None);
    }

    #[test]
    fn content_is_empty_without_body() {
        let article = ArticleRecord::default();
        assert_eq!(article.content(), "");
    }

    #[test]
    fn display_renders_title_byline_and_body() {
        let article = ArticleRecord {
            title: "标题".to_string(),
            author: "作者".to_string(),
            account_name: "公众号".to_string(),
            pub_time: DateTime::from_timestamp(0, 0),
            body: Some(ContentNode::element(
                "p",
                vec![],
                vec![ContentNode::text("正文")],
            )),
            ..Default::default()
        };
        assert_eq!(
            article.to_string(),
            "标题\n作者 公众号 1970-01-01T00:00:00+00:00\n正文\n"
        );
    }

    #[test]
    fn records_serialize_without_body_tree() {
        let article = ArticleRecord {
            title: "t".to_string(),
            body: Some(ContentNode::text("x")),
            ..Default::default()
        };
        let json = serde_json::to_value(&article).unwrap();
        assert!(json.get("body").is_none());
        assert_eq!(json["title"], "t");
    }
}
