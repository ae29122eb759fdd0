//! Typed records hydrated from rows.
//!
//! A [`Record`] declares a closed field set and a rename table mapping
//! store column names onto field names. Rows are hydrated through that
//! declaration rather than by reflecting over whatever columns come back.
use crate::core::db::{Row, Values};
use crate::core::{FromValue, LoreError, Result, Value};
use tracing::trace;

/// Field values handed to [`Record::from_fields`].
#[derive(Debug)]
pub struct FieldSet {
    table: &'static str,
    values: Values,
}

impl FieldSet {
    pub fn new(table: &'static str, values: Values) -> Self {
        FieldSet { table, values }
    }

    /// Takes a required field. Missing or NULL is a `Validation` error.
    pub fn take<T: FromValue>(&mut self, field: &str) -> Result<T> {
        match self.values.shift_remove(field) {
            None | Some(Value::Null) => Err(LoreError::validation(format!(
                "`{}` record is missing required field `{}`",
                self.table, field
            ))),
            Some(value) => T::from_value(value),
        }
    }

    /// Takes an optional field; missing and NULL both yield `None`.
    pub fn take_opt<T: FromValue>(&mut self, field: &str) -> Result<Option<T>> {
        match self.values.shift_remove(field) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => T::from_value(value).map(Some),
        }
    }
}

/// A typed projection of a row.
pub trait Record: Sized {
    /// Table the record is stored in
    const TABLE: &'static str;
    /// Declared fields, in declaration order
    const FIELDS: &'static [&'static str];
    /// Column name -> field name
    const RENAME: &'static [(&'static str, &'static str)] = &[];

    /// Builds the record, taking every declared field from `fields`.
    fn from_fields(fields: &mut FieldSet) -> Result<Self>;

    /// Current value of the declared field `name`.
    fn field(&self, name: &str) -> Value;

    /// Field name for a store column.
    fn field_name(column: &str) -> &str {
        Self::RENAME
            .iter()
            .find(|(c, _)| *c == column)
            .map_or(column, |(_, field)| *field)
    }

    /// Store column for a field name.
    fn column_name(field: &str) -> &str {
        Self::RENAME
            .iter()
            .find(|(_, f)| *f == field)
            .map_or(field, |(column, _)| *column)
    }

    /// Hydrates a row. Columns that map to no declared field (joined
    /// tables, computed columns) are skipped; the first occurrence of a
    /// repeated column wins.
    fn from_row(row: &Row) -> Result<Self> {
        let mut values = Values::new();
        for (column, value) in row.items() {
            let field = Self::field_name(column);
            if Self::FIELDS.iter().any(|f| *f == field) {
                values
                    .entry(field.to_string())
                    .or_insert_with(|| value.clone());
            } else {
                trace!(table = Self::TABLE, column, "skipping undeclared column");
            }
        }
        Self::from_fields(&mut FieldSet::new(Self::TABLE, values))
    }

    /// Builds a record from field-keyed values. Keys outside the declared
    /// field set are rejected.
    fn from_values(values: Values) -> Result<Self> {
        let unknown = values
            .keys()
            .find(|k| !Self::FIELDS.iter().any(|f| *f == k.as_str()));
        if let Some(unknown) = unknown {
            return Err(LoreError::validation(format!(
                "`{}` record has no field `{}`",
                Self::TABLE,
                unknown
            )));
        }
        Self::from_fields(&mut FieldSet::new(Self::TABLE, values))
    }

    /// Declared fields and their values, in declaration order.
    fn to_dict(&self) -> Values {
        Self::FIELDS
            .iter()
            .map(|field| (field.to_string(), self.field(field)))
            .collect()
    }

    fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_dict())?)
    }

    /// Comma-joined field values, in declaration order.
    fn to_csv(&self) -> String {
        Self::FIELDS
            .iter()
            .map(|field| self.field(field).to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Declared fields keyed by their store column names.
    fn column_values(&self) -> Values {
        Self::FIELDS
            .iter()
            .map(|field| (Self::column_name(field).to_string(), self.field(field)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Ship {
        registry: String,
        crew: Option<i64>,
    }

    impl Record for Ship {
        const TABLE: &'static str = "ships";
        const FIELDS: &'static [&'static str] = &["registry", "crew"];
        const RENAME: &'static [(&'static str, &'static str)] = &[("ships_val", "registry")];

        fn from_fields(fields: &mut FieldSet) -> Result<Self> {
            Ok(Ship {
                registry: fields.take("registry")?,
                crew: fields.take_opt("crew")?,
            })
        }

        fn field(&self, name: &str) -> Value {
            match name {
                "registry" => Value::from(self.registry.clone()),
                "crew" => Value::from(self.crew),
                _ => Value::Null,
            }
        }
    }

    fn row(columns: &[&str], values: Vec<Value>) -> Row {
        Row::new(columns.iter().map(|c| c.to_string()).collect(), values)
    }

    #[test]
    fn test_from_row_applies_rename_and_skips_unknown() {
        let ship = Ship::from_row(&row(
            &["ships_id", "ships_val", "crew", "captain"],
            vec![
                Value::Integer(1),
                Value::from("NCC-1701-D"),
                Value::Integer(1014),
                Value::from("picard"),
            ],
        ))
        .unwrap();
        assert_eq!(
            ship,
            Ship {
                registry: "NCC-1701-D".to_string(),
                crew: Some(1014)
            }
        );
    }

    #[test]
    fn test_from_row_missing_required_field() {
        let result = Ship::from_row(&row(&["crew"], vec![Value::Integer(3)]));
        assert!(matches!(result, Err(LoreError::Validation(_))));

        let result = Ship::from_row(&row(&["ships_val"], vec![Value::Null]));
        assert!(matches!(result, Err(LoreError::Validation(_))));
    }

    #[test]
    fn test_optional_field_may_be_absent() {
        let ship = Ship::from_row(&row(&["ships_val"], vec![Value::from("NX-01")])).unwrap();
        assert_eq!(ship.crew, None);
    }

    #[test]
    fn test_from_values_rejects_undeclared_fields() {
        let mut values = Values::new();
        values.insert("registry".to_string(), Value::from("NX-01"));
        values.insert("warp".to_string(), Value::Integer(5));
        assert!(matches!(
            Ship::from_values(values),
            Err(LoreError::Validation(_))
        ));
    }

    #[test]
    fn test_projections() {
        let ship = Ship {
            registry: "NX-01".to_string(),
            crew: None,
        };
        assert_eq!(ship.to_json().unwrap(), r#"{"registry":"NX-01","crew":null}"#);
        assert_eq!(ship.to_csv(), "NX-01,");

        let columns: Vec<String> = ship.column_values().keys().cloned().collect();
        assert_eq!(columns, vec!["ships_val", "crew"]);
    }
}
