//! Strider - page through social feed listings from the command line.
//!
//! # Usage
//!
//! ```bash
//! # First page of registered accounts, highest score first
//! strider users --sort=-score --count=10
//!
//! # Continue with the cursor printed by the previous call
//! strider users --sort=-score --count=10 --next-cursor=alice
//!
//! # Run migrations only
//! DATABASE_URL=postgres://localhost/strider strider --migrate-only
//! ```

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt};

use strider_core::metrics::init_metrics;
use strider_core::ports::{Page, PagingState};
use strider_core::services::{
    AccountListing, AccountSearch, AgeFilter, ArticleKind, ArticleListing, BanStatus,
    MessageListing, SortTables,
};
use strider_storage::{Database, DatabaseConfig, PgCollections};

/// Strider CLI - bidirectional keyset pagination over feed listings.
#[derive(Parser, Debug)]
#[command(name = "strider")]
#[command(about = "Strider - page through accounts, articles and messages")]
#[command(version)]
struct Cli {
    /// PostgreSQL database URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost/strider"
    )]
    database_url: String,

    /// Enable JSON log output.
    #[arg(long, env = "JSON_LOGS")]
    json_logs: bool,

    /// Run database migrations and exit.
    #[arg(long)]
    migrate_only: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

/// Paging parameters shared by every listing.
#[derive(Args, Debug)]
struct PageArgs {
    /// Sort token, e.g. `-score`. Unknown tokens use the listing default.
    #[arg(long, default_value = "")]
    sort: String,

    /// Identifier of the last record already held; fetches the next page.
    #[arg(long, conflicts_with = "prev_cursor")]
    next_cursor: Option<String>,

    /// Identifier of the first record already held; fetches the previous page.
    #[arg(long)]
    prev_cursor: Option<String>,

    /// Page size (default 20, at most 100).
    #[arg(long)]
    count: Option<u32>,
}

impl PageArgs {
    fn paging(&self) -> PagingState {
        PagingState::from_wire(
            self.next_cursor.as_deref(),
            self.prev_cursor.as_deref(),
            self.count,
        )
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Registered accounts.
    Users {
        #[command(flatten)]
        page: PageArgs,
    },
    /// Admin search over registered accounts.
    Search {
        /// Matches id, nickname, phone, about or hobby.
        #[arg(long)]
        keywords: Option<String>,
        /// `f`/`female`, or anything else for male and unspecified.
        #[arg(long)]
        gender: Option<String>,
        /// Age (`25`) or inclusive age range (`20-30`).
        #[arg(long, value_parser = parse_age)]
        age: Option<AgeFilter>,
        /// Ban status: normal, lock or ban.
        #[arg(long, value_parser = parse_ban)]
        ban: Option<BanStatus>,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Accounts whose nickname contains a string.
    Nickname {
        nickname: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// A user's friends, given as a comma-separated id list.
    Friends {
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<String>,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Top-level articles, optionally with one tag.
    Timeline {
        #[arg(long)]
        tag: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Articles written by one author.
    Articles {
        author: String,
        /// ARTICLES, COMMENTS, or empty for both.
        #[arg(long, default_value = "")]
        kind: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Comments on one article.
    Comments {
        parent: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Articles whose content contains a keyword.
    Find {
        keyword: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Messages between two users.
    Messages {
        user: String,
        peer: String,
        #[command(flatten)]
        page: PageArgs,
    },
}

/// Parse an age or age range.
fn parse_age(s: &str) -> Result<AgeFilter, String> {
    AgeFilter::parse(s).ok_or_else(|| format!("Invalid age '{}'. Use '25' or '20-30'.", s))
}

/// Parse a ban status token.
fn parse_ban(s: &str) -> Result<BanStatus, String> {
    BanStatus::parse(&s.to_lowercase()).ok_or_else(|| {
        format!(
            "Invalid ban status '{}'. Use 'normal', 'lock' or 'ban'.",
            s
        )
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs);
    init_metrics();

    debug!(database_url = %mask_password(&cli.database_url), "Database endpoint");

    // ─────────────────────────────────────────────────────────────────────────
    // 🗄️ DATABASE
    // ─────────────────────────────────────────────────────────────────────────
    let db = Database::connect(&DatabaseConfig::for_cli(&cli.database_url))
        .await
        .context("Failed to connect to database")?;

    db.migrate().await.context("Failed to run migrations")?;
    info!("🗄️  Database ready (migrations applied)");

    if cli.migrate_only {
        info!("🛑 --migrate-only flag set, exiting");
        db.close().await;
        return Ok(());
    }

    let Some(command) = cli.command else {
        db.close().await;
        bail!("No listing given, see --help");
    };

    // ─────────────────────────────────────────────────────────────────────────
    // 📄 PAGE
    // ─────────────────────────────────────────────────────────────────────────
    let collections = PgCollections::new(&db);
    let tables = SortTables::standard();
    let result = run(command, &collections, &tables).await;
    db.close().await;

    println!("{}", result?);
    Ok(())
}

/// Fetch the requested page and render it as JSON.
async fn run(command: Command, collections: &PgCollections, tables: &SortTables) -> Result<String> {
    let accounts = AccountListing::new(&collections.accounts, tables);

    match command {
        Command::Users { page } => render(
            accounts
                .users(&page.sort, page.paging())
                .await
                .context("Failed to list users")?,
        ),
        Command::Search {
            keywords,
            gender,
            age,
            ban,
            page,
        } => {
            let criteria = AccountSearch {
                keywords,
                gender,
                age,
                ban,
            };
            render(
                accounts
                    .search(&criteria, &page.sort, page.paging())
                    .await
                    .context("Failed to search accounts")?,
            )
        }
        Command::Nickname { nickname, page } => render(
            accounts
                .search_nickname(&nickname, page.paging())
                .await
                .context("Failed to search nicknames")?,
        ),
        Command::Friends { ids, page } => render(
            accounts
                .friends(&ids, &page.sort, page.paging())
                .await
                .context("Failed to list friends")?,
        ),
        Command::Timeline { tag, page } => render(
            ArticleListing::new(&collections.articles, tables)
                .with_sort(&page.sort)
                .timeline(tag.as_deref(), page.paging())
                .await
                .context("Failed to list timeline")?,
        ),
        Command::Articles { author, kind, page } => render(
            ArticleListing::new(&collections.articles, tables)
                .with_sort(&page.sort)
                .by_author(&author, ArticleKind::parse(&kind), page.paging())
                .await
                .context("Failed to list articles")?,
        ),
        Command::Comments { parent, page } => render(
            ArticleListing::new(&collections.articles, tables)
                .with_sort(&page.sort)
                .comments(&parent, page.paging())
                .await
                .context("Failed to list comments")?,
        ),
        Command::Find { keyword, page } => render(
            ArticleListing::new(&collections.articles, tables)
                .with_sort(&page.sort)
                .search(&keyword, page.paging())
                .await
                .context("Failed to search articles")?,
        ),
        Command::Messages { user, peer, page } => render(
            MessageListing::new(&collections.messages, tables)
                .with_sort(&page.sort)
                .conversation(&user, &peer, page.paging())
                .await
                .context("Failed to list messages")?,
        ),
    }
}

fn render<T: Serialize>(page: Page<T>) -> Result<String> {
    info!(
        records = page.records.len(),
        total = page.total(),
        "📄 Page fetched"
    );
    serde_json::to_string_pretty(&page).context("Failed to render page")
}

/// Initialize tracing subscriber.
fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        fmt()
            .with_env_filter(filter)
            .json()
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Mask password in database URL for logging.
fn mask_password(url_str: &str) -> String {
    match url::Url::parse(url_str) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("****"));
            }
            url.to_string()
        }
        Err(_) => url_str.to_string(),
    }
}
