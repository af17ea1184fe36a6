//! Port traits for entity collections.
//!
//! These traits define the only storage interface the pagination engine
//! uses. Implementations live in the infrastructure layer
//! (e.g., `strider-storage`) or in [`crate::memory`].

use async_trait::async_trait;

use crate::error::StorageResult;

use super::filter::{Filter, Value};
use super::pagination::OrderDirection;

/// Field holding every entity's unique identifier.
pub const ID_FIELD: &str = "id";

/// A record that can be paged through.
///
/// Entities expose a unique, stable identifier and read access to the
/// fields referenced by filters and sort keys.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Name of the collection holding this entity.
    const COLLECTION: &'static str;

    /// Unique identifier, used as cursor and as sort tiebreaker.
    fn id(&self) -> &str;

    /// Read a field by name. `None` for unknown fields.
    fn field(&self, name: &str) -> Option<Value>;
}

/// One component of a store-level ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortField {
    pub field: &'static str,
    pub direction: OrderDirection,
}

impl SortField {
    pub fn asc(field: &'static str) -> Self {
        Self {
            field,
            direction: OrderDirection::Asc,
        }
    }

    pub fn desc(field: &'static str) -> Self {
        Self {
            field,
            direction: OrderDirection::Desc,
        }
    }
}

/// Collection accessor for one entity type.
#[async_trait]
pub trait Collection<E: Entity>: Send + Sync {
    /// Get a single record by identifier.
    async fn find_by_id(&self, id: &str) -> StorageResult<Option<E>>;

    /// Records matching `filter`, ordered by `sort`, at most `limit` of them.
    async fn query(
        &self,
        filter: &Filter,
        sort: &[SortField],
        limit: usize,
    ) -> StorageResult<Vec<E>>;

    /// Number of records matching `filter`.
    async fn count(&self, filter: &Filter) -> StorageResult<u64>;
}
