//! Generic PostgreSQL collection.

use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::QueryAs;
use sqlx::{FromRow, PgPool, Postgres};
use tracing::{debug, instrument};

use strider_core::error::{StorageError, StorageResult};
use strider_core::ports::{Collection, Entity, Filter, ID_FIELD, SortField, Value};

use super::database::Database;
use super::sql::{Column, SqlBuilder};

/// An entity stored in one PostgreSQL table.
pub trait PgEntity: Entity {
    /// Raw row as fetched from the table.
    type Row: for<'r> FromRow<'r, PgRow> + Send + Unpin;

    const TABLE: &'static str;

    /// Comma-separated SELECT list matching [`PgEntity::Row`].
    const SELECT: &'static str;

    /// Columns usable in filters and orderings.
    const COLUMNS: &'static [Column];

    fn from_row(row: Self::Row) -> StorageResult<Self>;
}

/// PostgreSQL implementation of [`Collection`] for any [`PgEntity`].
pub struct PgCollection<E> {
    pool: PgPool,
    _entity: PhantomData<fn() -> E>,
}

impl<E: PgEntity> PgCollection<E> {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
            _entity: PhantomData,
        }
    }

    fn builder() -> SqlBuilder<'static> {
        SqlBuilder::new(E::COLLECTION, E::COLUMNS)
    }

    /// SELECT statement for one page, with its bind values.
    pub fn select_sql(
        filter: &Filter,
        sort: &[SortField],
        limit: usize,
    ) -> StorageResult<(String, Vec<Value>)> {
        let order_by = Self::builder().order_by(sort)?;
        let predicate = Self::builder().predicate(filter)?;
        let sql = format!(
            "SELECT {} FROM {} WHERE {} {} LIMIT {}",
            E::SELECT,
            E::TABLE,
            predicate.sql,
            order_by,
            limit
        );
        Ok((sql, predicate.params))
    }

    /// COUNT statement for `filter`, with its bind values.
    pub fn count_sql(filter: &Filter) -> StorageResult<(String, Vec<Value>)> {
        let predicate = Self::builder().predicate(filter)?;
        let sql = format!("SELECT COUNT(*) FROM {} WHERE {}", E::TABLE, predicate.sql);
        Ok((sql, predicate.params))
    }
}

#[async_trait]
impl<E: PgEntity> Collection<E> for PgCollection<E> {
    #[instrument(skip(self), fields(table = E::TABLE))]
    async fn find_by_id(&self, id: &str) -> StorageResult<Option<E>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = $1",
            E::SELECT,
            E::TABLE,
            ID_FIELD
        );
        let row = sqlx::query_as::<_, E::Row>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::QueryError(e.to_string()))?;

        row.map(E::from_row).transpose()
    }

    #[instrument(skip(self, filter, sort), fields(table = E::TABLE))]
    async fn query(&self, filter: &Filter, sort: &[SortField], limit: usize) -> StorageResult<Vec<E>> {
        let (sql, params) = Self::select_sql(filter, sort, limit)?;
        debug!(sql = %sql, params = params.len(), "Fetching page");

        let rows = bind_all(sqlx::query_as::<_, E::Row>(&sql), params)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::QueryError(e.to_string()))?;

        rows.into_iter().map(E::from_row).collect()
    }

    #[instrument(skip(self, filter), fields(table = E::TABLE))]
    async fn count(&self, filter: &Filter) -> StorageResult<u64> {
        let (sql, params) = Self::count_sql(filter)?;

        let count: (i64,) = bind_all(sqlx::query_as(&sql), params)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StorageError::QueryError(e.to_string()))?;

        Ok(count.0 as u64)
    }
}

// =============================================================================
// Binding
// =============================================================================

fn bind_all<'q, O>(
    mut query: QueryAs<'q, Postgres, O, PgArguments>,
    params: Vec<Value>,
) -> QueryAs<'q, Postgres, O, PgArguments> {
    for value in params {
        query = match value {
            Value::Null => query.bind(None::<String>),
            Value::Bool(b) => query.bind(b),
            Value::Int(i) => query.bind(i),
            Value::Text(s) => query.bind(s),
            Value::Time(t) => query.bind(t),
            Value::List(items) => query.bind(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::Text(s) => Some(s),
                        _ => None,
                    })
                    .collect::<Vec<String>>(),
            ),
        };
    }
    query
}
