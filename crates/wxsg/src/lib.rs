// ABOUTME: Library entry point for wxsg, a scraper for Sogou WeChat search and WeChat article pages.
// ABOUTME: Re-exports the public API: Client, ClientBuilder, Options, the record types and WxsgError.

//! wxsg - structured extraction from Sogou WeChat search results, WeChat
//! articles and topic (album) pages.
//!
//! The crate fetches a page once, parses it, and reads a fixed layout into
//! plain record values. Article bodies are kept as an owned tree and rendered
//! to text on demand.
//!
//! # Example
//!
//! ```no_run
//! use wxsg::{Client, WxsgError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), WxsgError> {
//!     let client = Client::builder().build()?;
//!     let article = client
//!         .latest_article_by_account("睡前消息编辑部", Some("MQZstudio"))
//!         .await?;
//!     println!("{}", article);
//!     Ok(())
//! }
//! ```
//!
//! Saved pages can be read without a network:
//!
//! ```
//! let html = r#"<div id="js_content"><p>hello</p></div>"#;
//! let article = wxsg::builders::article_from_html(html, "https://mp.weixin.qq.com/s/x").unwrap();
//! assert_eq!(article.content(), "hello\n");
//! ```

pub mod builders;
pub mod client;
pub mod content;
pub mod error;
pub mod options;
pub mod patterns;
pub mod query;
pub mod records;
pub mod redirect;
pub mod resource;

pub use client::{Client, SearchKind};
pub use content::{flatten, ContentNode};
pub use error::{ErrorCode, Result, WxsgError};
pub use options::{ClientBuilder, Options, DEFAULT_USER_AGENT};
pub use records::{
    AccountRecord, AlbumArticleRef, AlbumRecord, ArticleRecord, ArticleSearchRecord,
    LatestArticle, TopicRef,
};
