//! In-process [`Collection`] implementation.
//!
//! Holds records in a vector and evaluates filters and orderings directly
//! against [`Entity::field`]. Useful for tests and for embedding small,
//! fully loaded datasets.

use std::cmp::Ordering;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{StorageError, StorageResult};
use crate::ports::{Collection, Entity, Filter, OrderDirection, SortField, Value};

/// Vector-backed collection.
pub struct MemoryCollection<E: Entity> {
    records: RwLock<Vec<E>>,
}

impl<E: Entity> MemoryCollection<E> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// Insert or replace a record by identifier.
    pub fn upsert(&self, record: E) -> StorageResult<()> {
        let mut records = self.write()?;
        match records.iter_mut().find(|r| r.id() == record.id()) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        Ok(())
    }

    /// Remove a record, returning whether it existed.
    pub fn remove(&self, id: &str) -> StorageResult<bool> {
        let mut records = self.write()?;
        let before = records.len();
        records.retain(|r| r.id() != id);
        Ok(records.len() != before)
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> StorageResult<std::sync::RwLockReadGuard<'_, Vec<E>>> {
        self.records
            .read()
            .map_err(|e| StorageError::QueryError(e.to_string()))
    }

    fn write(&self) -> StorageResult<std::sync::RwLockWriteGuard<'_, Vec<E>>> {
        self.records
            .write()
            .map_err(|e| StorageError::QueryError(e.to_string()))
    }
}

impl<E: Entity> Default for MemoryCollection<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> FromIterator<E> for MemoryCollection<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Self {
            records: RwLock::new(iter.into_iter().collect()),
        }
    }
}

/// Compare two records under a multi-field ordering.
fn compare<E: Entity>(a: &E, b: &E, sort: &[SortField]) -> Ordering {
    for key in sort {
        let left = a.field(key.field).unwrap_or(Value::Null);
        let right = b.field(key.field).unwrap_or(Value::Null);
        let ord = match key.direction {
            OrderDirection::Asc => left.total_cmp(&right),
            OrderDirection::Desc => right.total_cmp(&left),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

#[async_trait]
impl<E: Entity> Collection<E> for MemoryCollection<E> {
    async fn find_by_id(&self, id: &str) -> StorageResult<Option<E>> {
        Ok(self.read()?.iter().find(|r| r.id() == id).cloned())
    }

    async fn query(&self, filter: &Filter, sort: &[SortField], limit: usize) -> StorageResult<Vec<E>> {
        let mut matched: Vec<E> = self
            .read()?
            .iter()
            .filter(|r| filter.evaluate(&|name: &str| r.field(name)))
            .cloned()
            .collect();
        matched.sort_by(|a, b| compare(a, b, sort));
        matched.truncate(limit);
        Ok(matched)
    }

    async fn count(&self, filter: &Filter) -> StorageResult<u64> {
        let count = self
            .read()?
            .iter()
            .filter(|r| filter.evaluate(&|name: &str| r.field(name)))
            .count();
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Article, fields};
    use chrono::{TimeZone, Utc};

    fn article(id: &str, parent: Option<&str>, secs: i64) -> Article {
        Article {
            id: id.into(),
            author: "alice".into(),
            parent: parent.map(Into::into),
            tags: vec!["run".into()],
            content: format!("post {id}"),
            pub_time: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn test_upsert_replaces_by_id() {
        let articles = MemoryCollection::new();
        articles.upsert(article("a", None, 10)).unwrap();
        articles.upsert(article("a", None, 20)).unwrap();
        assert_eq!(articles.len(), 1);

        assert!(articles.remove("a").unwrap());
        assert!(!articles.remove("a").unwrap());
        assert!(articles.is_empty());
    }

    #[tokio::test]
    async fn test_query_filters_sorts_and_limits() {
        let articles: MemoryCollection<Article> = [
            article("a", None, 10),
            article("b", Some("a"), 30),
            article("c", None, 20),
            article("d", None, 20),
        ]
        .into_iter()
        .collect();

        let sort = [SortField::desc(fields::PUB_TIME), SortField::desc(fields::ID)];
        let posts = articles
            .query(&Filter::IsNull(fields::PARENT), &sort, 10)
            .await
            .unwrap();
        let ids: Vec<&str> = posts.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "c", "a"]);

        let limited = articles.query(&Filter::All, &sort, 2).await.unwrap();
        assert_eq!(limited.len(), 2);
        assert_eq!(articles.count(&Filter::IsNull(fields::PARENT)).await.unwrap(), 3);
        assert!(articles.find_by_id("zz").await.unwrap().is_none());
    }
}
