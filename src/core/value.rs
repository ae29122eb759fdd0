/// Value Module
///
/// A dynamically typed SQL value. Filters, bound parameters and hydrated row
/// cells all travel as [`Value`] so the compiler can accept loosely-typed
/// input and still bind every parameter through SQLite.
use crate::core::{LoreError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use serde::Serialize;
use std::fmt;

/// Text form of `Date` values, as stored and displayed.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Text form of `Timestamp` values; fractional seconds only when non-zero.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A single SQL value.
///
/// `List` never comes out of SQLite; it is produced by coercing separated
/// text and is expanded into one placeholder per element when bound.
/// `Boolean`, `Date` and `Timestamp` come from columns declared with those
/// types (see [`crate::core::db::decltype`]) and bind back as their storage
/// form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Boolean(bool),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    List(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the text content if this is a `Text` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(f) => Value::Real(f),
            // TEXT cells holding invalid UTF-8 keep their bytes
            ValueRef::Text(t) => match std::str::from_utf8(t) {
                Ok(text) => Value::Text(text.to_string()),
                Err(_) => Value::Blob(t.to_vec()),
            },
            ValueRef::Blob(b) => Value::Blob(b.to_vec()),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::Timestamp(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Text(s) => f.write_str(s),
            Value::Blob(b) => write!(f, "<BLOB: {} bytes>", b.len()),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Value::Timestamp(t) => write!(f, "{}", t.format(TIMESTAMP_FORMAT)),
            Value::List(items) => {
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

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value_ref = match self {
            Value::Null => ValueRef::Null,
            Value::Integer(i) => ValueRef::Integer(*i),
            Value::Real(r) => ValueRef::Real(*r),
            Value::Text(s) => ValueRef::Text(s.as_bytes()),
            Value::Blob(b) => ValueRef::Blob(b),
            Value::Boolean(b) => ValueRef::Integer(i64::from(*b)),
            Value::Date(_) | Value::Timestamp(_) => {
                return Ok(ToSqlOutput::from(self.to_string()));
            }
            Value::List(_) => {
                return Err(rusqlite::Error::ToSqlConversionFailure(Box::new(
                    LoreError::validation("a list value must be expanded before binding"),
                )))
            }
        };
        Ok(ToSqlOutput::Borrowed(value_ref))
    }
}

/// Conversion from a [`Value`] into a typed record field.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Text(text) => Ok(text),
            Value::Integer(i) => Ok(i.to_string()),
            Value::Real(r) => Ok(r.to_string()),
            other => Err(LoreError::validation(format!(
                "expected text, found {:?}",
                other
            ))),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Integer(i) => Ok(i),
            Value::Text(text) => text
                .trim()
                .parse::<i64>()
                .map_err(|_| LoreError::validation(format!("expected integer, found {:?}", text))),
            other => Err(LoreError::validation(format!(
                "expected integer, found {:?}",
                other
            ))),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Real(r) => Ok(r),
            Value::Integer(i) => Ok(i as f64),
            other => Err(LoreError::validation(format!(
                "expected real, found {:?}",
                other
            ))),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(b) => Ok(b),
            Value::Integer(i) => Ok(i != 0),
            other => Err(LoreError::validation(format!(
                "expected boolean, found {:?}",
                other
            ))),
        }
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Date(d) => Ok(d),
            Value::Timestamp(t) => Ok(t.date()),
            other => Err(LoreError::validation(format!(
                "expected date, found {:?}",
                other
            ))),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Timestamp(t) => Ok(t),
            other => Err(LoreError::validation(format!(
                "expected timestamp, found {:?}",
                other
            ))),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}
