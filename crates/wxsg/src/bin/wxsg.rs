// ABOUTME: CLI binary for wxsg: search accounts and articles, fetch articles and albums, parse saved pages.
// ABOUTME: Prints pretty JSON by default; --text prints articles as title, byline and flattened body.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use url::Url;
use wxsg::builders::{
    accounts_from_html, album_from_html, article_from_html, article_results_from_html,
};
use wxsg::options::{DEFAULT_MP_BASE, DEFAULT_SEARCH_BASE};
use wxsg::{redirect, resource, ArticleRecord, Client};

#[derive(Parser, Debug)]
#[command(name = "wxsg")]
#[command(about = "Extract accounts, articles and albums from Sogou WeChat search and WeChat pages")]
struct Args {
    /// User-Agent header sent with every request
    #[arg(long, global = true, env = "WXSG_USER_AGENT")]
    user_agent: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "WXSG_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Origin of the search engine
    #[arg(long, global = true, env = "WXSG_SEARCH_BASE", default_value = DEFAULT_SEARCH_BASE)]
    search_base: String,

    /// Origin of the article site
    #[arg(long, global = true, env = "WXSG_MP_BASE", default_value = DEFAULT_MP_BASE)]
    mp_base: String,

    /// Print articles as text (title, byline, body) instead of JSON
    #[arg(long, global = true)]
    text: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search official accounts
    Accounts {
        query: String,
        #[arg(long, default_value_t = 1)]
        page: i32,
    },
    /// Search articles
    Articles {
        query: String,
        #[arg(long, default_value_t = 1)]
        page: i32,
    },
    /// Fetch one article by url, or by exact title
    Article {
        #[arg(long, conflicts_with = "title", required_unless_present = "title")]
        url: Option<String>,
        #[arg(long)]
        title: Option<String>,
        /// Account name the titled article must belong to
        #[arg(long, requires = "title")]
        account: Option<String>,
    },
    /// Fetch the latest article of an account
    Latest {
        #[arg(long)]
        name: String,
        /// Weixin id the account must have
        #[arg(long)]
        id: Option<String>,
    },
    /// Fetch a topic page by url or album id
    Album {
        #[arg(long, conflicts_with = "id", required_unless_present = "id")]
        url: Option<String>,
        #[arg(long)]
        id: Option<String>,
        /// Oldest articles first
        #[arg(long)]
        reverse: bool,
    },
    /// Print the article url hidden behind a search-engine link
    Resolve { url: String },
    /// Read a saved page without touching the network
    Parse {
        #[arg(long, value_enum)]
        kind: PageKind,
        #[arg(long)]
        html: PathBuf,
        /// Url the saved article page came from
        #[arg(long, default_value = "")]
        url: String,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum PageKind {
    Accounts,
    Articles,
    Article,
    Album,
    Redirect,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build_client(args: &Args) -> anyhow::Result<Client> {
    let mut builder = Client::builder()
        .timeout(Duration::from_secs(args.timeout_secs))
        .search_base(args.search_base.as_str())
        .mp_base(args.mp_base.as_str());
    if let Some(ua) = &args.user_agent {
        builder = builder.user_agent(ua.as_str());
    }
    Ok(builder.build()?)
}

fn to_json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Articles serialize without their body tree, so JSON output carries the flattened text.
fn render_article(article: &ArticleRecord, text: bool) -> anyhow::Result<String> {
    if text {
        return Ok(article.to_string());
    }
    let mut value = serde_json::to_value(article)?;
    if let Some(obj) = value.as_object_mut() {
        obj.insert("content".to_string(), article.content().into());
    }
    to_json(&value)
}

fn parse_saved(args: &Args, kind: PageKind, html: &Path, url: &str) -> anyhow::Result<String> {
    let bytes = fs::read(html)
        .map_err(|e| anyhow::anyhow!("error reading file {:?}: {}", html, e))?;
    let page = resource::decode(&bytes, None, url);
    match kind {
        PageKind::Accounts => to_json(&accounts_from_html(&page, &Url::parse(&args.search_base)?)?),
        PageKind::Articles => to_json(&article_results_from_html(
            &page,
            &Url::parse(&args.search_base)?,
        )?),
        PageKind::Article => render_article(&article_from_html(&page, url)?, args.text),
        PageKind::Album => to_json(&album_from_html(&page)?),
        PageKind::Redirect => Ok(redirect::reconstruct(&bytes)?),
    }
}

async fn run(args: &Args) -> anyhow::Result<String> {
    let client = || build_client(args);
    match &args.command {
        Command::Parse { kind, html, url } => parse_saved(args, *kind, html, url),
        Command::Accounts { query, page } => {
            to_json(&client()?.search_accounts(query, *page).await?)
        }
        Command::Articles { query, page } => {
            to_json(&client()?.search_articles(query, *page).await?)
        }
        Command::Article {
            url: Some(url), ..
        } => render_article(&client()?.article_by_url(url).await?, args.text),
        Command::Article {
            title: Some(title),
            account,
            ..
        } => render_article(
            &client()?
                .article_by_title(title, account.as_deref())
                .await?,
            args.text,
        ),
        Command::Article { .. } => Err(anyhow::anyhow!("either --url or --title is required")),
        Command::Latest { name, id } => render_article(
            &client()?
                .latest_article_by_account(name, id.as_deref())
                .await?,
            args.text,
        ),
        Command::Album {
            url: Some(url),
            reverse,
            ..
        } => to_json(&client()?.album_by_url(url, *reverse).await?),
        Command::Album {
            id: Some(id),
            reverse,
            ..
        } => to_json(&client()?.album_by_id(id, *reverse).await?),
        Command::Album { .. } => Err(anyhow::anyhow!("either --url or --id is required")),
        Command::Resolve { url } => Ok(client()?.resolve_article_url(url).await?),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing();

    match run(&args).await {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(1)
        }
    }
}
