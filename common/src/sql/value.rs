// Scalar values carried by generated clauses and their sqlx binding

use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::{Query, QueryAs};
use std::fmt;

/// A value bound to a positional placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Bound as a PostgreSQL array, used with `= ANY($N)`
    List(Vec<SqlValue>),
}

impl SqlValue {
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        SqlValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => Ok(()),
            SqlValue::Bool(b) => write!(f, "{}", b),
            SqlValue::Int(i) => write!(f, "{}", i),
            SqlValue::Float(x) => write!(f, "{}", x),
            SqlValue::Text(s) => f.write_str(s),
            SqlValue::List(items) => {
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<&String> for SqlValue {
    fn from(value: &String) -> Self {
        SqlValue::Text(value.clone())
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(i64::from(value))
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

/// Element type of a bound list, picked from its non-null members
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Bool,
    Int,
    Float,
    Text,
}

fn list_kind(items: &[SqlValue]) -> ListKind {
    let mut kind: Option<ListKind> = None;
    for item in items {
        let next = match item {
            SqlValue::Null => continue,
            SqlValue::Bool(_) => ListKind::Bool,
            SqlValue::Int(_) => ListKind::Int,
            SqlValue::Float(_) => ListKind::Float,
            SqlValue::Text(_) | SqlValue::List(_) => ListKind::Text,
        };
        kind = Some(match (kind, next) {
            (None, k) => k,
            (Some(a), b) if a == b => a,
            (Some(ListKind::Int), ListKind::Float) | (Some(ListKind::Float), ListKind::Int) => {
                ListKind::Float
            }
            _ => ListKind::Text,
        });
    }
    kind.unwrap_or(ListKind::Text)
}

fn as_bool(value: &SqlValue) -> Option<bool> {
    match value {
        SqlValue::Bool(b) => Some(*b),
        _ => None,
    }
}

fn as_i64(value: &SqlValue) -> Option<i64> {
    match value {
        SqlValue::Int(i) => Some(*i),
        _ => None,
    }
}

fn as_f64(value: &SqlValue) -> Option<f64> {
    match value {
        SqlValue::Int(i) => Some(*i as f64),
        SqlValue::Float(x) => Some(*x),
        _ => None,
    }
}

fn as_text(value: &SqlValue) -> Option<String> {
    match value {
        SqlValue::Null => None,
        other => Some(other.to_string()),
    }
}

/// Binds [`SqlValue`]s onto sqlx queries in placeholder order
pub trait BindSqlValues: Sized {
    fn bind_sql_value(self, value: &SqlValue) -> Self;

    fn bind_sql_values(self, values: &[SqlValue]) -> Self {
        values
            .iter()
            .fold(self, |query, value| query.bind_sql_value(value))
    }
}

impl<'q> BindSqlValues for Query<'q, Postgres, PgArguments> {
    fn bind_sql_value(self, value: &SqlValue) -> Self {
        match value {
            SqlValue::Null => self.bind(None::<String>),
            SqlValue::Bool(b) => self.bind(*b),
            SqlValue::Int(i) => self.bind(*i),
            SqlValue::Float(x) => self.bind(*x),
            SqlValue::Text(s) => self.bind(s.clone()),
            SqlValue::List(items) => match list_kind(items) {
                ListKind::Bool => self.bind(items.iter().map(as_bool).collect::<Vec<_>>()),
                ListKind::Int => self.bind(items.iter().map(as_i64).collect::<Vec<_>>()),
                ListKind::Float => self.bind(items.iter().map(as_f64).collect::<Vec<_>>()),
                ListKind::Text => self.bind(items.iter().map(as_text).collect::<Vec<_>>()),
            },
        }
    }
}

impl<'q, O> BindSqlValues for QueryAs<'q, Postgres, O, PgArguments> {
    fn bind_sql_value(self, value: &SqlValue) -> Self {
        match value {
            SqlValue::Null => self.bind(None::<String>),
            SqlValue::Bool(b) => self.bind(*b),
            SqlValue::Int(i) => self.bind(*i),
            SqlValue::Float(x) => self.bind(*x),
            SqlValue::Text(s) => self.bind(s.clone()),
            SqlValue::List(items) => match list_kind(items) {
                ListKind::Bool => self.bind(items.iter().map(as_bool).collect::<Vec<_>>()),
                ListKind::Int => self.bind(items.iter().map(as_i64).collect::<Vec<_>>()),
                ListKind::Float => self.bind(items.iter().map(as_f64).collect::<Vec<_>>()),
                ListKind::Text => self.bind(items.iter().map(as_text).collect::<Vec<_>>()),
            },
        }
    }
}
