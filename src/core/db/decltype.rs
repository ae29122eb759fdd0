/// Declared Type Module
///
/// Converts cells read from SQLite according to the type their column was
/// declared with. SQLite itself only stores NULL, INTEGER, REAL, TEXT and
/// BLOB, so booleans, dates and timestamps come back in their storage form
/// until converted here.
///
/// | declared type           | stored as                    | becomes     |
/// |-------------------------|------------------------------|-------------|
/// | `BOOLEAN`, `BOOL`       | integer, or `true`/`false`   | `Boolean`   |
/// | `DATE`                  | `YYYY-MM-DD`                 | `Date`      |
/// | `TIMESTAMP`, `DATETIME` | `YYYY-MM-DD HH:MM:SS[.f]`, or unix seconds | `Timestamp` |
///
/// Cells that do not parse under their declared type are left unchanged.
use crate::core::value::{DATE_FORMAT, TIMESTAMP_FORMAT};
use crate::core::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::trace;

/// Families of declared types with a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredType {
    Boolean,
    Date,
    Timestamp,
}

impl DeclaredType {
    /// Recognizes a declared type, ignoring case and any `(n)` suffix.
    pub fn parse(decl: &str) -> Option<Self> {
        let base = decl.split('(').next().unwrap_or(decl).trim().to_ascii_uppercase();
        match base.as_str() {
            "BOOLEAN" | "BOOL" => Some(DeclaredType::Boolean),
            "DATE" => Some(DeclaredType::Date),
            "TIMESTAMP" | "DATETIME" => Some(DeclaredType::Timestamp),
            _ => None,
        }
    }

    fn convert(self, value: Value) -> Value {
        let converted = match (self, &value) {
            (_, Value::Null) => None,
            (DeclaredType::Boolean, Value::Integer(i)) => Some(Value::Boolean(*i != 0)),
            (DeclaredType::Boolean, Value::Text(text)) => parse_bool(text).map(Value::Boolean),
            (DeclaredType::Date, Value::Text(text)) => {
                NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
                    .ok()
                    .map(Value::Date)
            }
            (DeclaredType::Timestamp, Value::Text(text)) => {
                parse_timestamp(text.trim()).map(Value::Timestamp)
            }
            (DeclaredType::Timestamp, Value::Integer(secs)) => DateTime::from_timestamp(*secs, 0)
                .map(|at| Value::Timestamp(at.naive_utc())),
            _ => None,
        };

        match converted {
            Some(converted) => converted,
            None => {
                if !value.is_null() {
                    trace!(declared = ?self, ?value, "cell kept in storage form");
                }
                value
            }
        }
    }
}

/// Converts `value` according to `decl`, the column's declared type.
pub fn convert(decl: Option<&str>, value: Value) -> Value {
    match decl.and_then(DeclaredType::parse) {
        Some(declared) => declared.convert(value),
        None => value,
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" => Some(true),
        "0" | "false" | "f" | "no" => Some(false),
        _ => None,
    }
}

fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, DATE_FORMAT)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stardate() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2364, 3, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_declared_type() {
        assert_eq!(DeclaredType::parse("boolean"), Some(DeclaredType::Boolean));
        assert_eq!(DeclaredType::parse("DATETIME"), Some(DeclaredType::Timestamp));
        assert_eq!(DeclaredType::parse("TIMESTAMP(6)"), Some(DeclaredType::Timestamp));
        assert_eq!(DeclaredType::parse("TEXT"), None);
        assert_eq!(DeclaredType::parse(""), None);
    }

    #[test]
    fn test_boolean_conversion() {
        assert_eq!(convert(Some("BOOLEAN"), Value::Integer(1)), Value::Boolean(true));
        assert_eq!(convert(Some("BOOL"), Value::Integer(0)), Value::Boolean(false));
        assert_eq!(convert(Some("BOOLEAN"), Value::from("false")), Value::Boolean(false));
        assert_eq!(convert(Some("BOOLEAN"), Value::from("maybe")), Value::from("maybe"));
    }

    #[test]
    fn test_date_and_timestamp_conversion() {
        assert_eq!(
            convert(Some("DATE"), Value::from("2364-03-01")),
            Value::Date(stardate().date())
        );
        assert_eq!(
            convert(Some("TIMESTAMP"), Value::from("2364-03-01 09:30:00")),
            Value::Timestamp(stardate())
        );
        assert_eq!(
            convert(Some("TIMESTAMP"), Value::from("2364-03-01T09:30:00")),
            Value::Timestamp(stardate())
        );
        assert_eq!(
            convert(Some("DATETIME"), Value::Integer(0)),
            Value::Timestamp(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_unconverted_cells_are_unchanged() {
        assert_eq!(convert(None, Value::Integer(1)), Value::Integer(1));
        assert_eq!(convert(Some("INTEGER"), Value::Integer(1)), Value::Integer(1));
        assert_eq!(convert(Some("DATE"), Value::Null), Value::Null);
        assert_eq!(convert(Some("DATE"), Value::from("stardate")), Value::from("stardate"));
    }
}
