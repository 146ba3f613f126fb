// ABOUTME: Builder for a WeChat article page: byline fields, publish time, topics and the retained body.
// ABOUTME: Publish time and topics come from inline scripts, with markup fallbacks when scripts lack them.

use scraper::{ElementRef, Html};
use tracing::debug;

use super::parse_document;
use crate::content::ContentNode;
use crate::error::Result;
use crate::patterns::{self, TimestampPattern};
use crate::query;
use crate::records::{ArticleRecord, TopicRef};

const CONTAINER: &str = "#img-content";
const TITLE: &str = "#activity-name";
const AUTHOR: &str = "#meta_content > span.rich_media_meta.rich_media_meta_text";
const ACCOUNT_NAME: &str = "#js_name";
const DETAIL_SCRIPTS: &str = "#activity-detail > script";
const PUBLISH_MARKER: &str = "publish_time";
const TAG_ROWS: &str = "#js_tags > div.article-tags";
const BODY: &str = "#js_content";

/// Build an article record from a parsed article page fetched from `url`.
pub fn build_article(doc: &Html, url: &str) -> ArticleRecord {
    let root = doc.root_element();
    let container = query::first(root, CONTAINER);
    let field = |css: &str| {
        container
            .map(|c| query::text(c, css).trim().to_string())
            .unwrap_or_default()
    };

    let record = ArticleRecord {
        title: field(TITLE),
        author: field(AUTHOR),
        account_name: field(ACCOUNT_NAME),
        pub_time: publish_time(root),
        url: url.to_string(),
        topics: topics(root, container),
        body: query::first(root, BODY).map(ContentNode::from_element),
    };
    debug!(
        url,
        title = %record.title,
        topics = record.topics.len(),
        has_body = record.body.is_some(),
        "built article record"
    );
    record
}

/// Parse `html` and build an article record from it.
pub fn article_from_html(html: &str, url: &str) -> Result<ArticleRecord> {
    let doc = parse_document(html, "BuildArticle").map_err(|e| e.with_url(url))?;
    Ok(build_article(&doc, url))
}

// The first detail script mentioning publish_time decides, even when it holds
// no epoch literal. Pages without that script fall back to oriCreateTime.
fn publish_time(root: ElementRef<'_>) -> Option<chrono::DateTime<chrono::Utc>> {
    let marked = query::select_all(root, DETAIL_SCRIPTS)
        .into_iter()
        .map(query::element_text)
        .find(|text| text.contains(PUBLISH_MARKER));
    match marked {
        Some(text) => TimestampPattern::QuotedEpoch.find(&text),
        None => query::select_all(root, "script")
            .into_iter()
            .find_map(|s| TimestampPattern::OriCreateTime.find(&query::element_text(s))),
    }
}

// The first script carrying a publicTagInfo array wins, even if none of its
// objects are complete. Without one, the rendered tag rows are read instead.
fn topics(root: ElementRef<'_>, container: Option<ElementRef<'_>>) -> Vec<TopicRef> {
    let from_script = query::select_all(root, "script")
        .into_iter()
        .find_map(|s| patterns::topic_refs(&query::element_text(s)));
    if let Some(topics) = from_script {
        return topics;
    }
    container
        .map(|c| query::children_of(c, TAG_ROWS))
        .unwrap_or_default()
        .into_iter()
        .map(topic_from_row)
        .collect()
}

fn topic_from_row(row: ElementRef<'_>) -> TopicRef {
    let children = query::child_elements(row);
    let name = children
        .first()
        .map(|c| query::element_text(*c))
        .unwrap_or_default();
    let count = children
        .iter()
        .flat_map(|c| query::child_elements(*c))
        .next()
        .map(query::element_text)
        .unwrap_or_default();
    let attr = |name: &str| row.value().attr(name).unwrap_or_default().trim().to_string();
    TopicRef {
        id: attr("data-album_id"),
        name: name.trim().to_string(),
        count: count.trim().to_string(),
        url: attr("data-url"),
    }
}
