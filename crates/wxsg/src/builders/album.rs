// ABOUTME: Builder for a topic (album) page: header fields and the ordered list of member articles.
// ABOUTME: Each entry field defaults on its own: index -1, placeholder title, no time, no image.

use scraper::{ElementRef, Html};
use tracing::debug;

use super::parse_document;
use crate::error::Result;
use crate::patterns::parse_unix_seconds;
use crate::query;
use crate::records::{AlbumArticleRef, AlbumRecord, TITLE_PLACEHOLDER};

const CONTAINER: &str = "#js_content_overlay > div:nth-child(1) > div";
const NAME: &str = "div.album__head.js_album_head > div > div > div > div > div";
const ACCOUNT_NAME: &str = "div.album__head-content.no-desc > div > div.album__author-info.js_profile_info.js_wx_tap_highlight.wx_tap_link > div > div";
const COUNT: &str = "div.album__head-content.no-desc > div > div.album__desc.album__head_fold.js_album_desc.no-desc > div.album__desc-content.js_album_desc_content > span";
const LIST: &str = "div.album__content.js_album_bd > ul";
const ITEM_TIME: &str = "div.album__item-content > div.album__item-info > span";
const ITEM_IMAGE: &str = "div.album__item-img";

const STYLE_PREFIX: &str = "background-image: url(";
const STYLE_SUFFIX: &str = ");";

/// Build an album record from a parsed topic page.
pub fn build_album(doc: &Html) -> AlbumRecord {
    let root = doc.root_element();
    let record = AlbumRecord {
        name: query::text(root, &within(NAME)),
        account_name: query::text(root, &within(ACCOUNT_NAME)),
        count: query::text(root, &within(COUNT)),
        articles: query::children_of(root, &within(LIST))
            .into_iter()
            .map(album_entry)
            .collect(),
    };
    debug!(
        name = %record.name,
        articles = record.articles.len(),
        "built album record"
    );
    record
}

/// Parse `html` and build an album record from it.
pub fn album_from_html(html: &str) -> Result<AlbumRecord> {
    let doc = parse_document(html, "BuildAlbum")?;
    Ok(build_album(&doc))
}

fn within(css: &str) -> String {
    format!("{CONTAINER} {css}")
}

fn album_entry(item: ElementRef<'_>) -> AlbumArticleRef {
    let attr = |name: &str| item.value().attr(name);
    AlbumArticleRef {
        index: attr("data-pos_num")
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(-1),
        title: attr("data-title").unwrap_or(TITLE_PLACEHOLDER).to_string(),
        url: attr("data-link").unwrap_or_default().to_string(),
        pub_time: parse_unix_seconds(&query::text(item, ITEM_TIME)),
        image: query::attr(item, ITEM_IMAGE, "style").map(|style| strip_background(&style)),
    }
}

/// `background-image: url(X);` to `X`. Either wrapper half is optional.
fn strip_background(style: &str) -> String {
    let inner = style.strip_prefix(STYLE_PREFIX).unwrap_or(style);
    inner.strip_suffix(STYLE_SUFFIX).unwrap_or(inner).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn page(items: &str) -> String {
        format!(
            r#"<html><body><div id="js_content_overlay"><div><div class="album">
              <div class="album__head js_album_head"><div><div><div><div><div>睡前消息</div></div></div></div></div></div>
              <div class="album__head-content no-desc"><div>
                <div class="album__author-info js_profile_info js_wx_tap_highlight wx_tap_link"><div><div>睡前消息编辑部</div></div></div>
                <div class="album__desc album__head_fold js_album_desc no-desc"><div class="album__desc-content js_album_desc_content"><span>1024个</span></div></div>
              </div></div>
              <div class="album__content js_album_bd"><ul class="album__list">{items}</ul></div>
            </div></div></div></body></html>"#
        )
    }

    const FULL_ITEM: &str = r#"<li class="album__list-item" data-pos_num="1" data-title="睡前消息【2021-12-31】" data-link="http://mp.weixin.qq.com/s?__biz=MzU&amp;mid=1">
        <div class="album__item-content"><div class="album__item-title">睡前消息【2021-12-31】</div>
          <div class="album__item-info"><span class="js_article_create_time">1640966400</span></div></div>
        <div class="album__item-img" style="background-image: url(https://mmbiz.qpic.cn/cover1.jpg);"></div>
    </li>"#;

    #[test]
    fn header_and_entries_are_read() {
        let album = album_from_html(&page(FULL_ITEM)).unwrap();
        assert_eq!(album.name, "睡前消息");
        assert_eq!(album.account_name, "睡前消息编辑部");
        assert_eq!(album.count, "1024个");
        assert_eq!(
            album.articles,
            vec![AlbumArticleRef {
                index: 1,
                title: "睡前消息【2021-12-31】".to_string(),
                url: "http://mp.weixin.qq.com/s?__biz=MzU&mid=1".to_string(),
                pub_time: chrono::DateTime::from_timestamp(1_640_966_400, 0),
                image: Some("https://mmbiz.qpic.cn/cover1.jpg".to_string()),
            }]
        );
    }

    #[test]
    fn entry_fields_default_independently() {
        let items = r#"
            <li data-title="无序号" data-link="l1"><div class="album__item-content"><div class="album__item-info"><span>1640966400</span></div></div></li>
            <li data-pos_num="2" data-link="l2"><div class="album__item-content"><div class="album__item-info"><span>1640966400</span></div></div></li>
            <li data-pos_num="3" data-title="坏时间"><div class="album__item-content"><div class="album__item-info"><span>昨天</span></div></div></li>
            <li data-pos_num="abc" data-title="坏序号"></li>
        "#;
        let album = album_from_html(&page(items)).unwrap();
        let a = &album.articles;
        assert_eq!(a.len(), 4);

        assert_eq!(a[0].index, -1);
        assert_eq!(a[0].title, "无序号");
        assert_eq!(a[0].pub_time.map(|t| t.timestamp()), Some(1_640_966_400));

        assert_eq!(a[1].index, 2);
        assert_eq!(a[1].title, TITLE_PLACEHOLDER);
        assert_eq!(a[1].url, "l2");

        assert_eq!(a[2].index, 3);
        assert_eq!(a[2].title, "坏时间");
        assert_eq!(a[2].pub_time, None);
        assert_eq!(a[2].url, "");

        assert_eq!(a[3].index, -1);
        assert_eq!(a[3].image, None);
    }

    #[test]
    fn entries_keep_served_order() {
        let items = r#"<li data-pos_num="3"></li><li data-pos_num="2"></li><li data-pos_num="1"></li>"#;
        let album = album_from_html(&page(items)).unwrap();
        let order: Vec<i32> = album.articles.iter().map(|a| a.index).collect();
        assert_eq!(order, vec![3, 2, 1]);
    }

    #[test]
    fn style_wrapper_is_stripped() {
        assert_eq!(strip_background("background-image: url(https://x/y.jpg);"), "https://x/y.jpg");
        assert_eq!(strip_background("https://x/y.jpg"), "https://x/y.jpg");
    }

    #[test]
    fn unrelated_page_is_empty_album() {
        let album = album_from_html("<html><body>nothing</body></html>").unwrap();
        assert_eq!(album, AlbumRecord::default());
    }
}
