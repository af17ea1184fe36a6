//! PostgreSQL storage adapter.
//!
//! This module implements the `Collection` port defined in `strider-core`
//! using PostgreSQL as the backing store.
//!
//! # Architecture
//!
//! - [`Database`] - Connection pool and migrations
//! - [`PgCollection`] - Generic collection over one table
//! - [`PgCollections`] - One collection per entity
//! - Filters are translated to parameterized SQL by [`SqlBuilder`]
//!
//! # Usage
//!
//! ```ignore
//! let config = DatabaseConfig::for_cli(&database_url);
//! let db = Database::connect(&config).await?;
//! db.migrate().await?;
//!
//! let collections = PgCollections::new(&db);
//! ```

mod account_repo;
mod article_repo;
mod collection;
mod database;
mod message_repo;
mod sql;

pub use collection::{PgCollection, PgEntity};
pub use database::{Database, DatabaseConfig};
pub use sql::{Column, ColumnKind, SqlBuilder, SqlFragment};

use strider_core::models::{Account, Article, Message};

// =============================================================================
// Composite Collections
// =============================================================================

/// Aggregated PostgreSQL collections for every listed entity.
pub struct PgCollections {
    pub accounts: PgCollection<Account>,
    pub articles: PgCollection<Article>,
    pub messages: PgCollection<Message>,
}

impl PgCollections {
    /// Create the collections from a database connection.
    pub fn new(db: &Database) -> Self {
        Self {
            accounts: PgCollection::new(db),
            articles: PgCollection::new(db),
            messages: PgCollection::new(db),
        }
    }
}
