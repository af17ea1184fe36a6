//! Sort specifications and per-listing sort tables.
//!
//! A [`SortTable`] maps the sort token a client sends (`"logintime"`,
//! `"-score"`, ...) to a [`SortSpec`]. Unknown tokens resolve to the table's
//! default order instead of failing, which keeps the listing APIs
//! permissive.
//!
//! Tables are built once by [`SortTables::standard`] and shared by
//! reference; nothing mutates them afterwards.

use std::collections::HashMap;

use crate::models::fields;
use crate::ports::{Comparison, ID_FIELD, OrderDirection, SortField};

/// A named, directional comparison path over one entity field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: &'static str,
    pub direction: OrderDirection,
}

impl SortKey {
    pub const fn asc(field: &'static str) -> Self {
        Self {
            field,
            direction: OrderDirection::Asc,
        }
    }

    pub const fn desc(field: &'static str) -> Self {
        Self {
            field,
            direction: OrderDirection::Desc,
        }
    }
}

/// A sort key paired with the unique tiebreaker field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub key: SortKey,
    pub tiebreaker: &'static str,
}

impl SortSpec {
    pub fn new(key: SortKey) -> Self {
        Self {
            key,
            tiebreaker: ID_FIELD,
        }
    }

    /// The same fields in the opposite direction.
    pub fn inverse(&self) -> Self {
        Self {
            key: SortKey {
                field: self.key.field,
                direction: self.key.direction.reversed(),
            },
            tiebreaker: self.tiebreaker,
        }
    }

    /// Store-level ordering: the key, then the tiebreaker in the same
    /// direction. When the key already is the tiebreaker it appears once.
    pub fn order(&self) -> Vec<SortField> {
        let key = SortField {
            field: self.key.field,
            direction: self.key.direction,
        };
        if self.key.field == self.tiebreaker {
            return vec![key];
        }
        vec![
            key,
            SortField {
                field: self.tiebreaker,
                direction: self.key.direction,
            },
        ]
    }

    /// Strict comparison selecting values that come after a boundary value
    /// in this order. Applies to the key and the tiebreaker alike.
    pub fn past_boundary(&self) -> Comparison {
        match self.key.direction {
            OrderDirection::Asc => Comparison::Gt,
            OrderDirection::Desc => Comparison::Lt,
        }
    }
}

/// Mapping from sort tokens to sort specifications for one listing.
#[derive(Debug, Clone)]
pub struct SortTable {
    entries: HashMap<&'static str, SortKey>,
    default: SortKey,
}

impl SortTable {
    /// Empty table that resolves every token to `default`.
    pub fn new(default: SortKey) -> Self {
        Self {
            entries: HashMap::new(),
            default,
        }
    }

    /// Register `token` for `key`.
    pub fn with(mut self, token: &'static str, key: SortKey) -> Self {
        self.entries.insert(token, key);
        self
    }

    /// Resolve a token, falling back to the default order.
    pub fn resolve(&self, token: &str) -> SortSpec {
        let key = self
            .entries
            .get(token.trim())
            .copied()
            .unwrap_or(self.default);
        SortSpec::new(key)
    }

    pub fn default_spec(&self) -> SortSpec {
        SortSpec::new(self.default)
    }

    /// Whether `token` is registered (as opposed to falling back).
    pub fn recognizes(&self, token: &str) -> bool {
        self.entries.contains_key(token.trim())
    }
}

/// Every sort table used by the listings.
#[derive(Debug, Clone)]
pub struct SortTables {
    /// Admin user list and admin search.
    pub accounts: SortTable,
    /// A user's friend list.
    pub friends: SortTable,
    /// Nickname search.
    pub nickname_search: SortTable,
    /// Timelines, author posts, comments and article search.
    pub articles: SortTable,
    /// Conversations.
    pub messages: SortTable,
}

impl SortTables {
    pub fn standard() -> Self {
        Self {
            accounts: account_table(),
            friends: friend_table(),
            nickname_search: SortTable::new(SortKey::desc(fields::LAST_LOGIN)),
            articles: SortTable::new(SortKey::desc(fields::PUB_TIME))
                .with("-pubtime", SortKey::desc(fields::PUB_TIME))
                .with("pubtime", SortKey::asc(fields::PUB_TIME)),
            messages: SortTable::new(SortKey::desc(fields::SENT_AT))
                .with("-time", SortKey::desc(fields::SENT_AT))
                .with("time", SortKey::asc(fields::SENT_AT)),
        }
    }
}

impl Default for SortTables {
    fn default() -> Self {
        Self::standard()
    }
}

fn account_table() -> SortTable {
    SortTable::new(SortKey::desc(fields::REG_TIME))
        .with("logintime", SortKey::asc(fields::LAST_LOGIN))
        .with("-logintime", SortKey::desc(fields::LAST_LOGIN))
        .with("userid", SortKey::asc(fields::ID))
        .with("-userid", SortKey::desc(fields::ID))
        .with("nickname", SortKey::asc(fields::NICKNAME))
        .with("-nickname", SortKey::desc(fields::NICKNAME))
        .with("score", SortKey::asc(fields::SCORE))
        .with("-score", SortKey::desc(fields::SCORE))
        .with("regtime", SortKey::asc(fields::REG_TIME))
        .with("-regtime", SortKey::desc(fields::REG_TIME))
        // Older first means earlier birth first.
        .with("age", SortKey::desc(fields::BIRTH))
        .with("-age", SortKey::asc(fields::BIRTH))
        .with("gender", SortKey::asc(fields::GENDER))
        .with("-gender", SortKey::desc(fields::GENDER))
        .with("ban", SortKey::asc(fields::BAN_TIME))
        .with("-ban", SortKey::desc(fields::BAN_TIME))
}

fn friend_table() -> SortTable {
    SortTable::new(SortKey::desc(fields::REG_TIME))
        .with("logintime", SortKey::desc(fields::LAST_LOGIN))
        .with("userid", SortKey::asc(fields::ID))
        .with("nickname", SortKey::asc(fields::NICKNAME))
        .with("score", SortKey::desc(fields::SCORE))
        .with("regtime", SortKey::desc(fields::REG_TIME))
}
