//! Core domain layer for Strider.
//!
//! This crate contains the domain models, port traits (interfaces), and the
//! bidirectional keyset pagination engine. It follows hexagonal
//! architecture principles - this is the innermost layer with no
//! dependencies on infrastructure.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     strider (binary)                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    strider-storage                          │
//! │                     (PostgreSQL)                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │                     strider-core  ← YOU ARE HERE            │
//! │           (models, ports, paginator, listings)              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`models`] - Domain models (Account, Article, Message)
//! - [`ports`] - Collection port, filter language and paging types
//! - [`services`] - Sort tables, the paginator and per-entity listings
//! - [`memory`] - In-process collection
//! - [`error`] - Domain error types
//! - [`metrics`] - Metric definitions
//!
//! # Key Concepts
//!
//! ## Cursors
//!
//! A cursor is the identifier of the record at the edge of the page the
//! client already holds. `next_cursor` names the last record and continues
//! forward, `prev_cursor` names the first record and walks backward. A
//! cursor is cleared once its side is exhausted.
//!
//! ## Page Lifecycle
//!
//! 1. Resolve the cursor to its boundary record
//! 2. Filter around the boundary's sort-key value, excluding the boundary
//! 3. Fetch in the sort order, or its inverse when walking backward
//! 4. Restore canonical order
//! 5. Emit new cursors and the total count of the base filter

pub mod error;
pub mod memory;
pub mod metrics;
pub mod models;
pub mod ports;
pub mod services;
