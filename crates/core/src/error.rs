//! Error types for the pagination domain layer.
//!
//! This module defines two error types:
//!
//! - [`StorageError`] - Failures reported by a [`crate::ports::Collection`] adapter
//! - [`PaginationError`] - Failures of one page request, annotated with the
//!   stage that produced them
//!
//! `StorageError` has no `From` conversion into `PaginationError`; every call
//! site names its [`Stage`] through [`PaginationError::at`].

use std::fmt;

use thiserror::Error;

// =============================================================================
// Storage Errors
// =============================================================================

/// Database and collection adapter errors.
///
/// These errors originate from storage operations like lookups, queries,
/// counts and row decoding.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Failed to establish database connection.
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// Query execution failed.
    #[error("Query execution error: {0}")]
    QueryError(String),

    /// Database migration failed.
    #[error("Migration error: {0}")]
    MigrationError(String),

    /// Data serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// The adapter cannot express a filter or sort field.
    #[error("Unsupported field '{field}' in collection {collection}")]
    UnsupportedField {
        /// Collection that rejected the field.
        collection: &'static str,
        /// Offending field name.
        field: String,
    },
}

// =============================================================================
// Pagination Errors
// =============================================================================

/// Step of a page request that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Loading the boundary record named by a cursor.
    Resolve,
    /// Fetching the page itself.
    Query,
    /// Counting the records matching the base filter.
    Count,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Resolve => "resolve",
            Stage::Query => "query",
            Stage::Count => "count",
        })
    }
}

/// Failure of one page request.
///
/// There is no partial result: a request either yields a full, normalized
/// page or one of these errors.
#[derive(Debug, Error)]
pub enum PaginationError {
    /// The cursor does not resolve to an existing record.
    ///
    /// Usually the boundary record was deleted between two page requests.
    #[error("Cursor '{cursor}' not found in {collection}")]
    NotFound {
        /// Collection that was searched.
        collection: &'static str,
        /// Identifier carried by the cursor.
        cursor: String,
    },

    /// A storage operation failed.
    #[error("Storage error during {stage}: {source}")]
    Storage {
        /// Stage that issued the failing operation.
        stage: Stage,
        /// Underlying adapter error.
        #[source]
        source: StorageError,
    },

    /// The paging request itself is malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl PaginationError {
    /// Annotate a storage error with the stage that produced it.
    pub fn at(stage: Stage) -> impl FnOnce(StorageError) -> Self {
        move |source| Self::Storage { stage, source }
    }

    /// Stage that produced a storage failure, if this is one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Storage { stage, .. } => Some(*stage),
            Self::NotFound { .. } => Some(Stage::Resolve),
            Self::InvalidArgument(_) => None,
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type for page requests.
pub type PaginationResult<T> = Result<T, PaginationError>;
