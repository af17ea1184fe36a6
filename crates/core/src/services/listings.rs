//! Entity listings built on the pagination engine.
//!
//! Each listing only supplies a collection, a base filter and a sort table;
//! boundary handling, ordering and cursor emission all live in
//! [`Paginator`].

use chrono::{DateTime, Months, NaiveDate, TimeZone, Utc};
use tracing::instrument;

use crate::error::PaginationResult;
use crate::models::{Account, Article, Message, fields};
use crate::ports::{Collection, Comparison, Filter, ID_FIELD, Page, PagingState, Value};

use super::paginator::Paginator;
use super::sort::SortTables;

/// Only accounts that completed registration are listed.
fn registered() -> Filter {
    Filter::gt(fields::REG_TIME, DateTime::<Utc>::UNIX_EPOCH)
}

// =============================================================================
// Accounts
// =============================================================================

/// Ban state filter for the admin search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BanStatus {
    /// Neither locked nor banned.
    Normal,
    /// Temporarily locked.
    Locked,
    /// Permanently banned.
    Banned,
}

impl BanStatus {
    /// Parse the admin API token (`normal`, `lock`, `ban`).
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "normal" => Some(BanStatus::Normal),
            "lock" => Some(BanStatus::Locked),
            "ban" => Some(BanStatus::Banned),
            _ => None,
        }
    }

    fn filter(self) -> Filter {
        match self {
            BanStatus::Normal => Filter::eq(fields::BAN_TIME, 0_i64),
            BanStatus::Locked => Filter::gt(fields::BAN_TIME, 0_i64),
            BanStatus::Banned => Filter::lt(fields::BAN_TIME, 0_i64),
        }
    }
}

/// Age criterion for the admin search, in whole years.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeFilter {
    /// Exactly this age. Age 0 selects accounts with no birth date.
    Exact(u32),
    /// Inclusive range. A range starting at 0 also selects accounts with no
    /// birth date.
    Between(u32, u32),
}

impl AgeFilter {
    /// Parse `"25"` or `"20-30"`. Malformed input yields `None`.
    pub fn parse(token: &str) -> Option<Self> {
        let parts: Vec<&str> = token.split('-').map(str::trim).collect();
        match parts.as_slice() {
            [age] => age.parse().ok().map(AgeFilter::Exact),
            [low, high] => {
                let low: u32 = low.parse().ok()?;
                let high: u32 = high.parse().ok()?;
                if low == high {
                    Some(AgeFilter::Exact(low))
                } else {
                    Some(AgeFilter::Between(low.min(high), low.max(high)))
                }
            }
            _ => None,
        }
    }

    fn filter(self, today: NaiveDate) -> Filter {
        match self {
            AgeFilter::Exact(0) => Filter::IsNull(fields::BIRTH),
            AgeFilter::Exact(age) => birth_between(birth_range(age, today)),
            AgeFilter::Between(low, high) => {
                let (start, _) = birth_range(high, today);
                let (_, end) = birth_range(low, today);
                let range = birth_between((start, end));
                if low == 0 {
                    Filter::Or(vec![range, Filter::IsNull(fields::BIRTH)])
                } else {
                    range
                }
            }
        }
    }
}

/// Birth times (Unix seconds, inclusive) of people who are `age` years old
/// on `today`.
fn birth_range(age: u32, today: NaiveDate) -> (i64, i64) {
    let latest = today
        .checked_sub_months(Months::new(age.saturating_mul(12)))
        .unwrap_or(NaiveDate::MIN);
    let earliest = today
        .checked_sub_months(Months::new(age.saturating_add(1).saturating_mul(12)))
        .and_then(|d| d.succ_opt())
        .unwrap_or(NaiveDate::MIN);
    let to_secs = |d: NaiveDate, end_of_day: bool| {
        let time = if end_of_day {
            d.and_hms_opt(23, 59, 59)
        } else {
            d.and_hms_opt(0, 0, 0)
        };
        time.map(|t| Utc.from_utc_datetime(&t).timestamp())
            .unwrap_or_default()
    };
    (to_secs(earliest, false), to_secs(latest, true))
}

fn birth_between((start, end): (i64, i64)) -> Filter {
    Filter::And(vec![
        Filter::compare(fields::BIRTH, Comparison::Gte, start),
        Filter::compare(fields::BIRTH, Comparison::Lte, end),
    ])
}

/// Admin search criteria. Empty criteria list every registered account.
#[derive(Debug, Clone, Default)]
pub struct AccountSearch {
    /// Case-insensitive match on id, nickname, phone, about or hobby.
    pub keywords: Option<String>,
    /// `f...` selects female accounts, anything else male or unspecified.
    pub gender: Option<String>,
    pub age: Option<AgeFilter>,
    pub ban: Option<BanStatus>,
}

impl AccountSearch {
    /// Base filter for these criteria, with ages evaluated on `today`.
    pub fn filter(&self, today: NaiveDate) -> Filter {
        let mut filter = registered();

        if let Some(keywords) = self.keywords.as_deref().filter(|k| !k.is_empty()) {
            filter = filter.and(Filter::Or(
                [
                    fields::ID,
                    fields::NICKNAME,
                    fields::PHONE,
                    fields::ABOUT,
                    fields::HOBBY,
                ]
                .into_iter()
                .map(|field| Filter::matches(field, keywords))
                .collect(),
            ));
        }

        if let Some(gender) = self.gender.as_deref().filter(|g| !g.is_empty()) {
            filter = filter.and(if gender.starts_with('f') {
                Filter::is_in(fields::GENDER, ["f", "female"])
            } else {
                Filter::Or(vec![
                    Filter::is_in(fields::GENDER, ["m", "male"]),
                    Filter::IsNull(fields::GENDER),
                ])
            });
        }

        if let Some(age) = self.age {
            filter = filter.and(age.filter(today));
        }

        if let Some(ban) = self.ban {
            filter = filter.and(ban.filter());
        }

        filter
    }
}

/// Paged account listings.
pub struct AccountListing<'a> {
    collection: &'a dyn Collection<Account>,
    tables: &'a SortTables,
}

impl<'a> AccountListing<'a> {
    pub fn new(collection: &'a dyn Collection<Account>, tables: &'a SortTables) -> Self {
        Self { collection, tables }
    }

    /// Every registered account.
    #[instrument(skip(self, paging))]
    pub async fn users(&self, sort: &str, paging: PagingState) -> PaginationResult<Page<Account>> {
        Paginator::new(self.collection, &self.tables.accounts)
            .paginate(registered(), sort, paging)
            .await
    }

    /// Admin search over registered accounts.
    #[instrument(skip(self, paging))]
    pub async fn search(
        &self,
        criteria: &AccountSearch,
        sort: &str,
        paging: PagingState,
    ) -> PaginationResult<Page<Account>> {
        let today = Utc::now().date_naive();
        Paginator::new(self.collection, &self.tables.accounts)
            .paginate(criteria.filter(today), sort, paging)
            .await
    }

    /// Accounts whose nickname contains `nickname`, most recently active
    /// first. An empty nickname lists everyone.
    #[instrument(skip(self, paging))]
    pub async fn search_nickname(
        &self,
        nickname: &str,
        paging: PagingState,
    ) -> PaginationResult<Page<Account>> {
        let mut filter = registered();
        if !nickname.is_empty() {
            filter = filter.and(Filter::matches(fields::NICKNAME, nickname));
        }
        Paginator::new(self.collection, &self.tables.nickname_search)
            .paginate(filter, "", paging)
            .await
    }

    /// The registered accounts among `ids`.
    #[instrument(skip(self, ids, paging), fields(friends = ids.len()))]
    pub async fn friends(
        &self,
        ids: &[String],
        sort: &str,
        paging: PagingState,
    ) -> PaginationResult<Page<Account>> {
        let filter = Filter::is_in(ID_FIELD, ids.iter().map(|id| Value::from(id.as_str())))
            .and(registered());
        Paginator::new(self.collection, &self.tables.friends)
            .paginate(filter, sort, paging)
            .await
    }
}

// =============================================================================
// Articles
// =============================================================================

/// Which of an author's articles to list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArticleKind {
    /// Posts and comments.
    #[default]
    All,
    /// Top-level posts only.
    Posts,
    /// Comments only.
    Comments,
}

impl ArticleKind {
    /// Parse the API token (`ARTICLES`, `COMMENTS`); anything else is `All`.
    pub fn parse(token: &str) -> Self {
        match token {
            "ARTICLES" => ArticleKind::Posts,
            "COMMENTS" => ArticleKind::Comments,
            _ => ArticleKind::All,
        }
    }
}

/// Paged article listings, newest first unless another sort token is set.
pub struct ArticleListing<'a> {
    collection: &'a dyn Collection<Article>,
    tables: &'a SortTables,
    sort: &'a str,
}

impl<'a> ArticleListing<'a> {
    pub fn new(collection: &'a dyn Collection<Article>, tables: &'a SortTables) -> Self {
        Self {
            collection,
            tables,
            sort: "",
        }
    }

    /// Use the sort token `sort` for every listing.
    pub fn with_sort(mut self, sort: &'a str) -> Self {
        self.sort = sort;
        self
    }

    async fn page(&self, filter: Filter, paging: PagingState) -> PaginationResult<Page<Article>> {
        Paginator::new(self.collection, &self.tables.articles)
            .paginate(filter, self.sort, paging)
            .await
    }

    /// Top-level posts, optionally restricted to one tag.
    #[instrument(skip(self, paging))]
    pub async fn timeline(
        &self,
        tag: Option<&str>,
        paging: PagingState,
    ) -> PaginationResult<Page<Article>> {
        let mut filter = Filter::IsNull(fields::PARENT);
        if let Some(tag) = tag.filter(|t| !t.is_empty()) {
            filter = filter.and(Filter::contains(fields::TAGS, tag));
        }
        self.page(filter, paging).await
    }

    /// Articles written by `author`.
    #[instrument(skip(self, paging))]
    pub async fn by_author(
        &self,
        author: &str,
        kind: ArticleKind,
        paging: PagingState,
    ) -> PaginationResult<Page<Article>> {
        let filter = Filter::eq(fields::AUTHOR, author);
        let filter = match kind {
            ArticleKind::All => filter,
            ArticleKind::Posts => filter.and(Filter::IsNull(fields::PARENT)),
            ArticleKind::Comments => filter.and(Filter::NotNull(fields::PARENT)),
        };
        self.page(filter, paging).await
    }

    /// Comments on the article `parent`.
    #[instrument(skip(self, paging))]
    pub async fn comments(
        &self,
        parent: &str,
        paging: PagingState,
    ) -> PaginationResult<Page<Article>> {
        self.page(Filter::eq(fields::PARENT, parent), paging).await
    }

    /// Articles whose content contains `keyword`, ignoring case.
    #[instrument(skip(self, paging))]
    pub async fn search(
        &self,
        keyword: &str,
        paging: PagingState,
    ) -> PaginationResult<Page<Article>> {
        self.page(Filter::matches(fields::CONTENT, keyword), paging)
            .await
    }
}

// =============================================================================
// Messages
// =============================================================================

/// Paged conversations, newest first unless another sort token is set.
pub struct MessageListing<'a> {
    collection: &'a dyn Collection<Message>,
    tables: &'a SortTables,
    sort: &'a str,
}

impl<'a> MessageListing<'a> {
    pub fn new(collection: &'a dyn Collection<Message>, tables: &'a SortTables) -> Self {
        Self {
            collection,
            tables,
            sort: "",
        }
    }

    /// Use the sort token `sort` for every listing.
    pub fn with_sort(mut self, sort: &'a str) -> Self {
        self.sort = sort;
        self
    }

    /// Messages exchanged between `user` and `peer`, in either direction.
    #[instrument(skip(self, paging))]
    pub async fn conversation(
        &self,
        user: &str,
        peer: &str,
        paging: PagingState,
    ) -> PaginationResult<Page<Message>> {
        let filter = Filter::Or(vec![
            Filter::eq(fields::SENDER, peer).and(Filter::eq(fields::RECIPIENT, user)),
            Filter::eq(fields::SENDER, user).and(Filter::eq(fields::RECIPIENT, peer)),
        ]);
        Paginator::new(self.collection, &self.tables.messages)
            .paginate(filter, self.sort, paging)
            .await
    }
}
