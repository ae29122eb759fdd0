/// Condition Compiler Module
///
/// Turns a loosely-typed filter specification into a WHERE fragment plus the
/// parameters bound to its placeholders.
///
/// A [`Condition`] is one of three shapes:
/// - a scalar: an integer-like value filters on `{table}_id`, plain text on
///   `{table}_val`, and text containing a comparison token is used verbatim;
/// - a mapping of column (or `(column, operator)`, or `AND`/`OR`/`NOT`) to
///   value or nested condition;
/// - a list of 1 to 3 elements, or a list of such lists.
///
/// # Trust boundary
///
/// Text containing a comparison token (`=`, `!=`, `<`, `<=`, `>`, `>=`,
/// ` IS `, ` IS NOT `, ` IN `) is emitted as-is without parameters, and so
/// are column names and operators. Those parts must never carry untrusted
/// input. Every other value is bound through a placeholder.
use crate::core::db::coerce::coerce;
use crate::core::{LoreError, Result, Value};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

static COMPARATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[=<>]|\sIS\s|\sIN\s").expect("comparator pattern is valid")
});

/// Boolean operator joining the terms of a mapping or list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Conjunction {
    #[default]
    And,
    Or,
}

impl Conjunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Conjunction::And => "AND",
            Conjunction::Or => "OR",
        }
    }
}

/// Key of a mapping condition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// `column = ?`
    Column(String),
    /// `column operator ?`; the operator is emitted verbatim
    Compare(String, String),
    /// Nested condition joined with the given conjunction
    Group(Conjunction),
    /// Nested condition, negated
    Not,
}

impl From<&str> for Key {
    fn from(key: &str) -> Self {
        match key {
            "AND" => Key::Group(Conjunction::And),
            "OR" => Key::Group(Conjunction::Or),
            "NOT" => Key::Not,
            column => Key::Column(column.to_string()),
        }
    }
}

impl From<String> for Key {
    fn from(key: String) -> Self {
        Key::from(key.as_str())
    }
}

impl From<(&str, &str)> for Key {
    fn from((column, operator): (&str, &str)) -> Self {
        Key::Compare(column.to_string(), operator.to_string())
    }
}

/// A filter specification.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Scalar(Value),
    Map(IndexMap<Key, Condition>),
    List(Vec<Condition>),
}

impl Condition {
    /// Builds a mapping condition, keeping insertion order.
    pub fn map<K, V, I>(pairs: I) -> Self
    where
        K: Into<Key>,
        V: Into<Condition>,
        I: IntoIterator<Item = (K, V)>,
    {
        Condition::Map(
            pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    /// Builds a list condition.
    pub fn list<V, I>(items: I) -> Self
    where
        V: Into<Condition>,
        I: IntoIterator<Item = V>,
    {
        Condition::List(items.into_iter().map(Into::into).collect())
    }

    fn is_list(&self) -> bool {
        matches!(self, Condition::List(_))
    }
}

impl From<Value> for Condition {
    fn from(value: Value) -> Self {
        Condition::Scalar(value)
    }
}

impl From<i64> for Condition {
    fn from(value: i64) -> Self {
        Condition::Scalar(Value::Integer(value))
    }
}

impl From<i32> for Condition {
    fn from(value: i32) -> Self {
        Condition::Scalar(Value::from(value))
    }
}

impl From<&str> for Condition {
    fn from(value: &str) -> Self {
        Condition::Scalar(Value::from(value))
    }
}

impl From<String> for Condition {
    fn from(value: String) -> Self {
        Condition::Scalar(Value::Text(value))
    }
}

/// A compiled WHERE fragment and its bound parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Clause {
    pub text: String,
    pub params: Vec<Value>,
}

impl Clause {
    fn raw(text: impl Into<String>) -> Self {
        Clause {
            text: text.into(),
            params: Vec::new(),
        }
    }

    /// `{lhs} {operator} ?`, with a list value expanded to `(?, ?, ...)`.
    ///
    /// A list is only accepted with `IN` or `NOT IN`.
    fn comparison(lhs: &str, operator: &str, value: Value) -> Result<Self> {
        if let Value::List(items) = &value {
            if !is_membership(operator) {
                return Err(LoreError::validation(format!(
                    "`{}` compares `{}` with a list of {} values; use IN",
                    operator,
                    lhs,
                    items.len()
                )));
            }
        }

        let mut params = Vec::new();
        let placeholder = placeholder(value, &mut params);
        Ok(Clause {
            text: format!("{} {} {}", lhs, operator, placeholder),
            params,
        })
    }

    /// Joins non-empty clauses with `conjunction`.
    fn join(parts: Vec<Clause>, conjunction: Conjunction) -> Self {
        let separator = format!(" {} ", conjunction.as_str());
        let mut joined = Clause::default();
        for part in parts.into_iter().filter(|part| !part.is_empty()) {
            if !joined.text.is_empty() {
                joined.text.push_str(&separator);
            }
            joined.text.push_str(&part.text);
            joined.params.extend(part.params);
        }
        joined
    }

    fn wrapped(self, prefix: &str) -> Self {
        Clause {
            text: format!("{}({})", prefix, self.text),
            params: self.params,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

fn is_membership(operator: &str) -> bool {
    let operator = operator
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_uppercase();
    operator == "IN" || operator == "NOT IN"
}

/// Pushes the parameters for `value` and returns its placeholder text.
fn placeholder(value: Value, params: &mut Vec<Value>) -> String {
    match value {
        Value::List(items) => {
            let marks = vec!["?"; items.len()].join(", ");
            params.extend(items);
            format!("({})", marks)
        }
        scalar => {
            params.push(scalar);
            "?".to_string()
        }
    }
}

/// Returns true when `text` contains a comparison token and is therefore
/// passed through as a pre-formed clause.
pub fn has_comparator(text: &str) -> bool {
    COMPARATOR.is_match(text)
}

/// Compiles `condition` into a WHERE fragment for `table`, joining terms
/// with `conjunction`.
///
/// An empty mapping compiles to an empty clause.
pub fn compile(table: &str, condition: &Condition, conjunction: Conjunction) -> Result<Clause> {
    match condition {
        Condition::Scalar(value) => compile_scalar(table, value),
        Condition::Map(pairs) => compile_map(table, pairs, conjunction),
        Condition::List(items) => compile_list(table, items, conjunction),
    }
}

/// Compiles `condition` with the default `AND` conjunction.
pub fn compile_where(table: &str, condition: &Condition) -> Result<Clause> {
    compile(table, condition, Conjunction::And)
}

fn compile_scalar(table: &str, value: &Value) -> Result<Clause> {
    match value {
        Value::Integer(id) => Clause::comparison(&format!("{}_id", table), "=", Value::Integer(*id)),
        Value::Text(text) => {
            if let Ok(id) = text.trim().parse::<i64>() {
                Clause::comparison(&format!("{}_id", table), "=", Value::Integer(id))
            } else if has_comparator(text) {
                Ok(Clause::raw(text.as_str()))
            } else {
                Clause::comparison(&format!("{}_val", table), "=", Value::Text(text.clone()))
            }
        }
        other => Err(LoreError::validation(format!(
            "unsupported scalar condition: {:?}",
            other
        ))),
    }
}

fn compile_map(
    table: &str,
    pairs: &IndexMap<Key, Condition>,
    conjunction: Conjunction,
) -> Result<Clause> {
    let mut parts = Vec::with_capacity(pairs.len());
    for (key, value) in pairs {
        let part = match key {
            Key::Group(nested) => {
                let clause = compile(table, value, *nested)?;
                if clause.is_empty() {
                    continue;
                }
                clause.wrapped("")
            }
            Key::Not => {
                let clause = compile(table, value, Conjunction::And)?;
                if clause.is_empty() {
                    continue;
                }
                clause.wrapped("NOT ")
            }
            Key::Compare(column, operator) => {
                Clause::comparison(column, operator, coerce(scalar(value, column)?))?
            }
            Key::Column(column) => Clause::comparison(column, "=", coerce(scalar(value, column)?))?,
        };
        parts.push(part);
    }
    Ok(Clause::join(parts, conjunction))
}

fn compile_list(table: &str, items: &[Condition], conjunction: Conjunction) -> Result<Clause> {
    if items.iter().any(Condition::is_list) {
        let parts = items
            .iter()
            .map(|item| compile(table, item, Conjunction::And))
            .collect::<Result<Vec<_>>>()?;
        return Ok(Clause::join(parts, conjunction));
    }

    match items {
        [only] => compile(table, only, conjunction),
        [column, value] => {
            let column = text(column)?;
            Clause::comparison(column, "=", coerce(scalar(value, column)?))
        }
        [column, operator, value] => {
            let column = text(column)?;
            Clause::comparison(column, text(operator)?, coerce(scalar(value, column)?))
        }
        _ => Err(LoreError::validation(format!(
            "list condition must have 1, 2 or 3 elements, found {}",
            items.len()
        ))),
    }
}

fn scalar(condition: &Condition, column: &str) -> Result<Value> {
    match condition {
        Condition::Scalar(value) => Ok(value.clone()),
        _ => Err(LoreError::validation(format!(
            "value for `{}` must be a scalar",
            column
        ))),
    }
}

fn text(condition: &Condition) -> Result<&str> {
    match condition {
        Condition::Scalar(Value::Text(text)) => Ok(text.as_str()),
        other => Err(LoreError::validation(format!(
            "expected a column name or operator, found {:?}",
            other
        ))),
    }
}
