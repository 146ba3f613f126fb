// ABOUTME: Builders for the search engine's account (type=1) and article (type=2) result pages.
// ABOUTME: An empty result list is an EmptyResult error; missing fields inside a block are defaulted.

use scraper::{ElementRef, Html};
use tracing::debug;
use url::Url;

use super::{absolutize, parse_document};
use crate::error::{Result, WxsgError};
use crate::patterns::TimestampPattern;
use crate::query;
use crate::records::{AccountRecord, ArticleSearchRecord, LatestArticle};

/// Container whose children are the result blocks, for both search kinds.
pub const RESULT_LIST: &str = "#main > div.news-box > ul";

const INTRODUCTION_LABEL: &str = "功能介绍";
const VERIFICATION_LABEL: &str = "认证";
const LATEST_ARTICLE_LABEL: &str = "最近文章";

const ACCOUNT_NAME: &str = "div.txt-box > p.tit > a";
const ACCOUNT_AVATAR: &str = "div.img-box > a > img";
const ACCOUNT_QR_CODE: &str = "div.ew-pop > span > img:nth-child(3)";
const ACCOUNT_WEIXIN_ID: &str = "div.txt-box > p.info > label";
const LATEST_LINK: &str = "dd > a";
const LATEST_SCRIPT: &str = "dd > span > script";

const ARTICLE_TITLE: &str = "div.txt-box > h3 > a";
const ARTICLE_PREVIEW: &str = "div.txt-box > p";
const ARTICLE_ACCOUNT: &str = "div.txt-box > div > a";
const ARTICLE_SCRIPT: &str = "div.txt-box > div > span > script";
const ARTICLE_IMAGE: &str = "div.img-box > a > img";

/// Build account records from an account search page.
///
/// Each result block is a list of rows. A row is routed by the text of its
/// `dt` label: no label is the identity row, otherwise the label is matched
/// against the introduction, verification and latest-article markers. Rows
/// with any other label are ignored.
pub fn build_accounts(doc: &Html, base: &Url) -> Result<Vec<AccountRecord>> {
    let blocks = result_blocks(doc, "BuildAccounts")?;
    let records: Vec<AccountRecord> = blocks
        .into_iter()
        .map(|block| account_from_block(block, base))
        .collect();
    debug!(count = records.len(), "built account records");
    Ok(records)
}

/// Parse `html` and build account records from it.
pub fn accounts_from_html(html: &str, base: &Url) -> Result<Vec<AccountRecord>> {
    let doc = parse_document(html, "BuildAccounts")?;
    build_accounts(&doc, base)
}

/// Build article records from an article search page.
pub fn build_article_results(doc: &Html, base: &Url) -> Result<Vec<ArticleSearchRecord>> {
    let blocks = result_blocks(doc, "BuildArticleResults")?;
    let records: Vec<ArticleSearchRecord> = blocks
        .into_iter()
        .map(|block| article_from_block(block, base))
        .collect();
    debug!(count = records.len(), "built article search records");
    Ok(records)
}

/// Parse `html` and build article search records from it.
pub fn article_results_from_html(html: &str, base: &Url) -> Result<Vec<ArticleSearchRecord>> {
    let doc = parse_document(html, "BuildArticleResults")?;
    build_article_results(&doc, base)
}

fn result_blocks<'a>(doc: &'a Html, op: &str) -> Result<Vec<ElementRef<'a>>> {
    let blocks = query::children_of(doc.root_element(), RESULT_LIST);
    if blocks.is_empty() {
        return Err(WxsgError::empty_result("", op));
    }
    Ok(blocks)
}

fn account_from_block(block: ElementRef<'_>, base: &Url) -> AccountRecord {
    let mut record = AccountRecord::default();
    for row in query::child_elements(block) {
        let label = query::text(row, "dt");
        if label.is_empty() {
            fill_identity(&mut record, row, base);
        } else if label.contains(INTRODUCTION_LABEL) {
            record.introduction = query::text(row, "dd");
        } else if label.contains(VERIFICATION_LABEL) {
            record.verification = Some(query::text(row, "dd").trim().to_string());
        } else if label.contains(LATEST_ARTICLE_LABEL) {
            record.latest_article = Some(latest_article(row, base));
        }
    }
    record
}

// Only fields actually present overwrite the record, so stray unlabeled rows
// after the identity row do not blank it.
fn fill_identity(record: &mut AccountRecord, row: ElementRef<'_>, base: &Url) {
    let name = query::text(row, ACCOUNT_NAME);
    if !name.is_empty() {
        record.name = name;
    }
    if let Some(href) = query::attr(row, ACCOUNT_NAME, "href") {
        record.url = absolutize(base, &href);
    }
    if let Some(src) = query::attr(row, ACCOUNT_AVATAR, "src") {
        record.avatar = absolutize(base, &src);
    }
    if let Some(src) = query::attr(row, ACCOUNT_QR_CODE, "src") {
        record.qr_code = absolutize(base, &src);
    }
    let weixin_id = query::text(row, ACCOUNT_WEIXIN_ID);
    if !weixin_id.is_empty() {
        record.weixin_id = weixin_id;
    }
}

fn latest_article(row: ElementRef<'_>, base: &Url) -> LatestArticle {
    LatestArticle {
        title: query::text(row, LATEST_LINK),
        url: query::attr(row, LATEST_LINK, "href")
            .map(|href| absolutize(base, &href))
            .unwrap_or_default(),
        pub_time: TimestampPattern::TimeConvert.find(&query::text(row, LATEST_SCRIPT)),
    }
}

fn article_from_block(block: ElementRef<'_>, base: &Url) -> ArticleSearchRecord {
    let link = |css: &str| {
        query::attr(block, css, "href")
            .map(|href| absolutize(base, &href))
            .unwrap_or_default()
    };
    ArticleSearchRecord {
        title: query::text(block, ARTICLE_TITLE),
        url: link(ARTICLE_TITLE),
        preview: query::text(block, ARTICLE_PREVIEW),
        account_name: query::text(block, ARTICLE_ACCOUNT),
        account_url: link(ARTICLE_ACCOUNT),
        pub_time: TimestampPattern::TimeConvert.find(&query::text(block, ARTICLE_SCRIPT)),
        image: query::attr(block, ARTICLE_IMAGE, "src").map(|src| absolutize(base, &src)),
    }
}
