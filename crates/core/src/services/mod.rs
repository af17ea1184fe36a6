//! Pagination engine and the listings built on it.

mod listings;
mod paginator;
mod sort;

pub use listings::*;
pub use paginator::*;
pub use sort::*;
