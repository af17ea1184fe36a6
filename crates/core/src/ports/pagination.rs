//! Pagination types for list queries.
//!
//! These types implement bidirectional keyset pagination: a client holds
//! the identifiers of the first and last records of the page it already
//! has, and asks for the records just after (`next_cursor`) or just before
//! (`prev_cursor`) one of them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Page size used when a request leaves the limit unset or zero.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest page a listing will hand out.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Opaque cursor for pagination.
///
/// The cursor value is the unique identifier of a boundary record and
/// should be treated as an opaque token by clients.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor {
    pub value: String,
}

impl Cursor {
    /// Parse a wire-level cursor. An empty or blank token means "no cursor".
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.is_empty() {
            None
        } else {
            Some(Self {
                value: token.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl From<&str> for Cursor {
    fn from(value: &str) -> Self {
        Self {
            value: value.to_string(),
        }
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// Ordering direction for sorted queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderDirection {
    /// Ascending order (smallest first).
    #[default]
    Asc,
    /// Descending order (largest first).
    Desc,
}

impl OrderDirection {
    /// Return the opposite direction.
    pub fn reversed(self) -> Self {
        match self {
            OrderDirection::Asc => OrderDirection::Desc,
            OrderDirection::Desc => OrderDirection::Asc,
        }
    }
}

/// Which way a request travels relative to the page the client holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Travel {
    /// No cursor: the first page in canonical order.
    First,
    /// After the `next_cursor` record.
    Forward,
    /// Before the `prev_cursor` record.
    Backward,
}

impl Travel {
    pub fn as_str(self) -> &'static str {
        match self {
            Travel::First => "first",
            Travel::Forward => "forward",
            Travel::Backward => "backward",
        }
    }
}

/// Request-scoped paging state.
///
/// Built fresh from client-supplied cursors, rewritten by the engine and
/// handed back with the page. It is never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingState {
    /// Identifier of the last record of the held page (page forward).
    #[serde(rename = "next_cursor", default, skip_serializing_if = "Option::is_none")]
    pub forward_cursor: Option<Cursor>,
    /// Identifier of the first record of the held page (page backward).
    #[serde(rename = "prev_cursor", default, skip_serializing_if = "Option::is_none")]
    pub backward_cursor: Option<Cursor>,
    /// Maximum number of records to return.
    #[serde(rename = "count", default)]
    pub limit: u32,
    /// Number of records matching the base filter.
    #[serde(rename = "total_number", default)]
    pub total: u64,
}

impl PagingState {
    /// First-page request with the given limit.
    pub fn first(limit: u32) -> Self {
        Self {
            limit,
            ..Default::default()
        }
    }

    /// Request the page after the record `cursor`.
    pub fn after(cursor: impl Into<Cursor>, limit: u32) -> Self {
        Self {
            forward_cursor: Some(cursor.into()),
            limit,
            ..Default::default()
        }
    }

    /// Request the page before the record `cursor`.
    pub fn before(cursor: impl Into<Cursor>, limit: u32) -> Self {
        Self {
            backward_cursor: Some(cursor.into()),
            limit,
            ..Default::default()
        }
    }

    /// Build from wire-level parameters.
    ///
    /// Empty cursors are dropped. An unset or zero count falls back to
    /// [`DEFAULT_PAGE_SIZE`] and oversized counts are clamped to
    /// [`MAX_PAGE_SIZE`].
    pub fn from_wire(next_cursor: Option<&str>, prev_cursor: Option<&str>, count: Option<u32>) -> Self {
        Self {
            forward_cursor: next_cursor.and_then(Cursor::parse),
            backward_cursor: prev_cursor.and_then(Cursor::parse),
            limit: normalize_limit(count),
            total: 0,
        }
    }

    /// Travel direction requested by this state.
    ///
    /// Only meaningful once the engine has checked that at most one cursor
    /// is present.
    pub fn travel(&self) -> Travel {
        match (&self.forward_cursor, &self.backward_cursor) {
            (Some(_), _) => Travel::Forward,
            (None, Some(_)) => Travel::Backward,
            (None, None) => Travel::First,
        }
    }
}

/// Default a missing or zero limit and clamp oversized ones.
pub fn normalize_limit(limit: Option<u32>) -> u32 {
    match limit {
        None | Some(0) => DEFAULT_PAGE_SIZE,
        Some(n) => n.min(MAX_PAGE_SIZE),
    }
}

/// Information about the current page in a paginated result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Whether there are more items after this page.
    pub has_next_page: bool,
    /// Whether there are items before this page.
    pub has_previous_page: bool,
}

/// One page of records in canonical order.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    /// Records, always in the declared order of the sort key.
    pub records: Vec<T>,
    /// Cursors and counts to hand back to the client.
    pub paging: PagingState,
    /// Whether neighbouring pages exist.
    pub page_info: PageInfo,
}

impl<T> Page<T> {
    pub fn total(&self) -> u64 {
        self.paging.total
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Transform the records, keeping cursors and page info.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            records: self.records.into_iter().map(f).collect(),
            paging: self.paging,
            page_info: self.page_info,
        }
    }
}
