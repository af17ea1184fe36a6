//! Storage layer for Strider.
//!
//! This crate provides PostgreSQL implementations of the `Collection` port
//! defined in `strider-core`. It handles connection pooling, migrations and
//! the translation of filters and orderings into SQL.
//!
//! # Usage
//!
//! ```ignore
//! use strider_core::ports::PagingState;
//! use strider_core::services::{AccountListing, SortTables};
//! use strider_storage::{Database, DatabaseConfig, PgCollections};
//!
//! let db = Database::connect(&DatabaseConfig::for_cli(&database_url)).await?;
//! db.migrate().await?;
//!
//! let collections = PgCollections::new(&db);
//! let tables = SortTables::standard();
//! let page = AccountListing::new(&collections.accounts, &tables)
//!     .users("-score", PagingState::first(20))
//!     .await?;
//! ```

pub mod postgres;

pub use postgres::{Database, DatabaseConfig, PgCollection, PgCollections};
