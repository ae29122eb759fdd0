/// Type Coercion Module
///
/// Converts raw text that is about to become a bound parameter into numeric
/// or list form. Coercion is total: when no numeric form parses, the original
/// value is kept.
use crate::core::Value;

/// Coerces text values into integers, reals or lists.
#[derive(Debug, Clone, PartialEq)]
pub struct Coercer {
    /// Splits text into a list when present
    pub separator: char,
    /// Substituted for `Value::Null`
    pub none: Value,
}

impl Default for Coercer {
    fn default() -> Self {
        Coercer {
            separator: ',',
            none: Value::Null,
        }
    }
}

impl Coercer {
    pub fn new(separator: char, none: Value) -> Self {
        Coercer { separator, none }
    }

    /// Coerces `value`.
    ///
    /// - `Null` becomes the configured `none` value.
    /// - Text containing the separator becomes a `List`, each trimmed element
    ///   coerced on its own.
    /// - Text containing `.` becomes a `Real` if it parses, other text an
    ///   `Integer` if it parses.
    /// - Anything else is returned unchanged.
    pub fn coerce(&self, value: Value) -> Value {
        match value {
            Value::Null => self.none.clone(),
            Value::Text(text) => self.coerce_text(text),
            other => other,
        }
    }

    fn coerce_text(&self, text: String) -> Value {
        if text.contains(self.separator) {
            return Value::List(
                text.split(self.separator)
                    .map(|elem| self.coerce_text(elem.trim().to_string()))
                    .collect(),
            );
        }

        let trimmed = text.trim();
        let parsed = if trimmed.contains('.') {
            trimmed.parse::<f64>().ok().map(Value::Real)
        } else {
            trimmed.parse::<i64>().ok().map(Value::Integer)
        };

        parsed.unwrap_or(Value::Text(text))
    }
}

/// Coerces `value` with the default separator (`,`) and `Null` default.
pub fn coerce(value: Value) -> Value {
    Coercer::default().coerce(value)
}
