//! Translation of the filter language into parameterized PostgreSQL.
//!
//! SAFETY: The generated SQL is safe from injection because:
//! 1. Column names come from a per-table whitelist, never from the filter
//! 2. Operators and keywords are hardcoded
//! 3. All VALUES are parameterized via $1, $2, etc. and bound separately
//! 4. Order direction comes from an enum (ASC/DESC), not user strings

use strider_core::error::{StorageError, StorageResult};
use strider_core::ports::{Comparison, Filter, OrderDirection, SortField, Value};

/// Storage shape of a filterable column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Single value per row.
    Scalar,
    /// `TEXT[]`.
    TextArray,
}

/// A column exposed to filters and orderings.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    /// Entity field name, also the column name.
    pub name: &'static str,
    pub kind: ColumnKind,
}

impl Column {
    pub const fn scalar(name: &'static str) -> Self {
        Self {
            name,
            kind: ColumnKind::Scalar,
        }
    }

    pub const fn text_array(name: &'static str) -> Self {
        Self {
            name,
            kind: ColumnKind::TextArray,
        }
    }
}

/// SQL fragment with the values to bind, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlFragment {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Builds WHERE and ORDER BY clauses for one table.
pub struct SqlBuilder<'a> {
    collection: &'static str,
    columns: &'a [Column],
    params: Vec<Value>,
}

impl<'a> SqlBuilder<'a> {
    pub fn new(collection: &'static str, columns: &'a [Column]) -> Self {
        Self {
            collection,
            columns,
            params: Vec::new(),
        }
    }

    /// Translate `filter` into a boolean SQL expression.
    pub fn predicate(mut self, filter: &Filter) -> StorageResult<SqlFragment> {
        let sql = self.expression(filter)?;
        Ok(SqlFragment {
            sql,
            params: self.params,
        })
    }

    fn column(&self, field: &str) -> StorageResult<Column> {
        self.columns
            .iter()
            .find(|c| c.name == field)
            .copied()
            .ok_or_else(|| StorageError::UnsupportedField {
                collection: self.collection,
                field: field.to_string(),
            })
    }

    fn placeholder(&mut self, value: Value) -> String {
        self.params.push(value);
        format!("${}", self.params.len())
    }

    fn expression(&mut self, filter: &Filter) -> StorageResult<String> {
        let sql = match filter {
            Filter::All => "TRUE".to_string(),
            Filter::Compare { field, op, value } => {
                let column = self.column(field)?;
                // Null only equals null and never orders against a value.
                if value.is_null() {
                    return Ok(match op {
                        Comparison::Eq => format!("{} IS NULL", column.name),
                        Comparison::Ne => format!("{} IS NOT NULL", column.name),
                        _ => "FALSE".to_string(),
                    });
                }
                let param = self.placeholder(value.clone());
                match op {
                    // `<>` alone would drop rows where the column is null.
                    Comparison::Ne => {
                        format!("{} IS DISTINCT FROM {}", column.name, param)
                    }
                    _ => format!("{} {} {}", column.name, operator(*op), param),
                }
            }
            Filter::In { field, values } => {
                let column = self.column(field)?;
                let has_null = values.iter().any(Value::is_null);
                let params: Vec<String> = values
                    .iter()
                    .filter(|v| !v.is_null())
                    .map(|v| self.placeholder(v.clone()))
                    .collect();
                match (params.is_empty(), has_null) {
                    (true, false) => "FALSE".to_string(),
                    (true, true) => format!("{} IS NULL", column.name),
                    (false, false) => format!("{} IN ({})", column.name, params.join(", ")),
                    (false, true) => format!(
                        "({} IN ({}) OR {} IS NULL)",
                        column.name,
                        params.join(", "),
                        column.name
                    ),
                }
            }
            Filter::Contains { field, value } => {
                let column = self.column(field)?;
                if column.kind != ColumnKind::TextArray || value.is_null() {
                    return Ok("FALSE".to_string());
                }
                let param = self.placeholder(value.clone());
                format!("{} = ANY({})", param, column.name)
            }
            Filter::IsNull(field) => format!("{} IS NULL", self.column(field)?.name),
            Filter::NotNull(field) => format!("{} IS NOT NULL", self.column(field)?.name),
            Filter::Matches { field, pattern } => {
                let column = self.column(field)?;
                let param = self.placeholder(Value::Text(like_pattern(pattern)));
                match column.kind {
                    ColumnKind::Scalar => {
                        format!("{} ILIKE {} ESCAPE '\\'", column.name, param)
                    }
                    ColumnKind::TextArray => format!(
                        "EXISTS (SELECT 1 FROM unnest({}) AS item WHERE item ILIKE {} ESCAPE '\\')",
                        column.name, param
                    ),
                }
            }
            Filter::And(filters) => self.join(filters, " AND ", "TRUE")?,
            Filter::Or(filters) => self.join(filters, " OR ", "FALSE")?,
        };
        Ok(sql)
    }

    fn join(&mut self, filters: &[Filter], separator: &str, empty: &str) -> StorageResult<String> {
        if filters.is_empty() {
            return Ok(empty.to_string());
        }
        let parts = filters
            .iter()
            .map(|f| self.expression(f))
            .collect::<StorageResult<Vec<_>>>()?;
        Ok(format!("({})", parts.join(separator)))
    }

    /// ORDER BY list for `sort`.
    ///
    /// Null sorts before every value, which PostgreSQL needs spelled out:
    /// its default puts nulls last in ascending order.
    pub fn order_by(&self, sort: &[SortField]) -> StorageResult<String> {
        if sort.is_empty() {
            return Ok(String::new());
        }
        let keys = sort
            .iter()
            .map(|key| {
                let column = self.column(key.field)?;
                Ok(match key.direction {
                    OrderDirection::Asc => format!("{} ASC NULLS FIRST", column.name),
                    OrderDirection::Desc => format!("{} DESC NULLS LAST", column.name),
                })
            })
            .collect::<StorageResult<Vec<_>>>()?;
        Ok(format!("ORDER BY {}", keys.join(", ")))
    }
}

fn operator(op: Comparison) -> &'static str {
    match op {
        Comparison::Eq => "=",
        Comparison::Ne => "<>",
        Comparison::Lt => "<",
        Comparison::Lte => "<=",
        Comparison::Gt => ">",
        Comparison::Gte => ">=",
    }
}

/// Substring pattern for ILIKE with wildcards in `text` escaped.
fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: &[Column] = &[
        Column::scalar("id"),
        Column::scalar("parent"),
        Column::scalar("pub_time"),
        Column::scalar("content"),
        Column::text_array("tags"),
    ];

    fn translate(filter: &Filter) -> SqlFragment {
        SqlBuilder::new("articles", COLUMNS).predicate(filter).unwrap()
    }

    #[test]
    fn test_boundary_filter_translation() {
        let filter = Filter::IsNull("parent").and(Filter::Or(vec![
            Filter::compare("pub_time", Comparison::Gt, 5_i64),
            Filter::eq("pub_time", 5_i64).and(Filter::compare("id", Comparison::Gt, "c")),
        ]));

        let fragment = translate(&filter);
        assert_eq!(
            fragment.sql,
            "(parent IS NULL AND (pub_time > $1 OR (pub_time = $2 AND id > $3)))"
        );
        assert_eq!(
            fragment.params,
            vec![Value::Int(5), Value::Int(5), Value::Text("c".into())]
        );
    }

    #[test]
    fn test_ne_keeps_null_rows() {
        let fragment = translate(&Filter::ne("parent", "a1"));
        assert_eq!(fragment.sql, "parent IS DISTINCT FROM $1");
    }

    // Test critique: un nom de champ inconnu ne doit jamais atteindre le SQL
    #[test]
    fn test_unknown_field_is_rejected() {
        let err = SqlBuilder::new("articles", COLUMNS)
            .predicate(&Filter::eq("content; DROP TABLE articles", "x"))
            .unwrap_err();
        assert!(matches!(err, StorageError::UnsupportedField { .. }));
    }

    #[test]
    fn test_null_comparisons() {
        assert_eq!(translate(&Filter::eq("parent", Value::Null)).sql, "parent IS NULL");
        assert_eq!(translate(&Filter::gt("parent", Value::Null)).sql, "FALSE");
        assert!(translate(&Filter::eq("parent", Value::Null)).params.is_empty());
    }

    #[test]
    fn test_membership_and_containment() {
        let fragment = translate(&Filter::is_in("id", ["a", "b"]));
        assert_eq!(fragment.sql, "id IN ($1, $2)");

        assert_eq!(translate(&Filter::is_in("id", Vec::<Value>::new())).sql, "FALSE");

        let fragment = translate(&Filter::contains("tags", "trail"));
        assert_eq!(fragment.sql, "$1 = ANY(tags)");
    }

    #[test]
    fn test_matches_escapes_wildcards() {
        let fragment = translate(&Filter::matches("content", "50%_off"));
        assert_eq!(fragment.sql, "content ILIKE $1 ESCAPE '\\'");
        assert_eq!(fragment.params, vec![Value::Text("%50\\%\\_off%".into())]);

        let fragment = translate(&Filter::matches("tags", "run"));
        assert!(fragment.sql.starts_with("EXISTS (SELECT 1 FROM unnest(tags)"));
    }

    #[test]
    fn test_order_by_places_nulls_first() {
        let builder = SqlBuilder::new("articles", COLUMNS);
        let sql = builder
            .order_by(&[SortField::desc("pub_time"), SortField::desc("id")])
            .unwrap();
        assert_eq!(sql, "ORDER BY pub_time DESC NULLS LAST, id DESC NULLS LAST");

        let sql = builder.order_by(&[SortField::asc("pub_time")]).unwrap();
        assert_eq!(sql, "ORDER BY pub_time ASC NULLS FIRST");
    }
}
