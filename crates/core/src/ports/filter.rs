//! Filter language shared by every collection adapter.
//!
//! Filters are a small closed AST. Field names are always `&'static str`
//! supplied by code (sort tables, listings), never by clients, so adapters
//! can map them onto columns without validating user input.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Values
// =============================================================================

/// A scalar (or list) field value extracted from an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    Time(DateTime<Utc>),
    List(Vec<Value>),
}

impl Value {
    /// Rank used to order values of different kinds. Null sorts first.
    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int(_) => 2,
            Value::Text(_) => 3,
            Value::Time(_) => 4,
            Value::List(_) => 5,
        }
    }

    /// Total order over values, used by in-process evaluation.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Time(a), Value::Time(b)) => a.cmp(b),
            (Value::List(a), Value::List(b)) => {
                for (x, y) in a.iter().zip(b) {
                    match x.total_cmp(y) {
                        Ordering::Equal => continue,
                        ord => return ord,
                    }
                }
                a.len().cmp(&b.len())
            }
            _ => self.rank().cmp(&other.rank()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Time(t)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

// =============================================================================
// Filters
// =============================================================================

/// Binary comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl Comparison {
    /// Whether `ordering` (field compared to value) satisfies the operator.
    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            Comparison::Eq => ordering == Ordering::Equal,
            Comparison::Ne => ordering != Ordering::Equal,
            Comparison::Lt => ordering == Ordering::Less,
            Comparison::Lte => ordering != Ordering::Greater,
            Comparison::Gt => ordering == Ordering::Greater,
            Comparison::Gte => ordering != Ordering::Less,
        }
    }
}

/// Store-level selection predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every record.
    All,
    /// `field <op> value`.
    Compare {
        field: &'static str,
        op: Comparison,
        value: Value,
    },
    /// `field ∈ values`.
    In {
        field: &'static str,
        values: Vec<Value>,
    },
    /// The list-valued `field` contains `value`.
    Contains { field: &'static str, value: Value },
    /// The field is absent or null.
    IsNull(&'static str),
    /// The field is present and not null.
    NotNull(&'static str),
    /// Case-insensitive substring match on a text field.
    Matches {
        field: &'static str,
        pattern: String,
    },
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn compare(field: &'static str, op: Comparison, value: impl Into<Value>) -> Self {
        Filter::Compare {
            field,
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: &'static str, value: impl Into<Value>) -> Self {
        Self::compare(field, Comparison::Eq, value)
    }

    pub fn ne(field: &'static str, value: impl Into<Value>) -> Self {
        Self::compare(field, Comparison::Ne, value)
    }

    pub fn gt(field: &'static str, value: impl Into<Value>) -> Self {
        Self::compare(field, Comparison::Gt, value)
    }

    pub fn lt(field: &'static str, value: impl Into<Value>) -> Self {
        Self::compare(field, Comparison::Lt, value)
    }

    pub fn is_in<V: Into<Value>>(field: &'static str, values: impl IntoIterator<Item = V>) -> Self {
        Filter::In {
            field,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(field: &'static str, value: impl Into<Value>) -> Self {
        Filter::Contains {
            field,
            value: value.into(),
        }
    }

    pub fn matches(field: &'static str, pattern: impl Into<String>) -> Self {
        Filter::Matches {
            field,
            pattern: pattern.into(),
        }
    }

    /// Conjunction of `self` and `other`, flattening nested `And`s.
    pub fn and(self, other: Filter) -> Self {
        match (self, other) {
            (Filter::All, f) | (f, Filter::All) => f,
            (Filter::And(mut a), Filter::And(b)) => {
                a.extend(b);
                Filter::And(a)
            }
            (Filter::And(mut a), f) => {
                a.push(f);
                Filter::And(a)
            }
            (f, Filter::And(mut b)) => {
                b.insert(0, f);
                Filter::And(b)
            }
            (a, b) => Filter::And(vec![a, b]),
        }
    }

    /// Evaluate the filter against a field accessor.
    ///
    /// Used by in-process collections; database adapters translate the AST
    /// instead. Missing fields read as [`Value::Null`].
    pub fn evaluate<F>(&self, field: &F) -> bool
    where
        F: Fn(&str) -> Option<Value>,
    {
        let read = |name: &str| field(name).unwrap_or(Value::Null);
        match self {
            Filter::All => true,
            Filter::Compare {
                field: name,
                op,
                value,
            } => {
                let current = read(name);
                // Null only ever equals null, it never orders against values.
                if current.is_null() || value.is_null() {
                    return match op {
                        Comparison::Eq => current.is_null() && value.is_null(),
                        Comparison::Ne => !(current.is_null() && value.is_null()),
                        _ => false,
                    };
                }
                op.holds(current.total_cmp(value))
            }
            Filter::In {
                field: name,
                values,
            } => {
                let current = read(name);
                values.iter().any(|v| v.total_cmp(&current).is_eq())
            }
            Filter::Contains {
                field: name,
                value,
            } => match read(name) {
                Value::List(items) => items.iter().any(|v| v.total_cmp(value).is_eq()),
                _ => false,
            },
            Filter::IsNull(name) => read(name).is_null(),
            Filter::NotNull(name) => !read(name).is_null(),
            Filter::Matches {
                field: name,
                pattern,
            } => match read(name) {
                Value::Text(text) => text.to_lowercase().contains(&pattern.to_lowercase()),
                Value::List(items) => items.iter().any(|item| match item {
                    Value::Text(text) => text.to_lowercase().contains(&pattern.to_lowercase()),
                    _ => false,
                }),
                _ => false,
            },
            Filter::And(filters) => filters.iter().all(|f| f.evaluate(field)),
            Filter::Or(filters) => filters.iter().any(|f| f.evaluate(field)),
        }
    }
}
