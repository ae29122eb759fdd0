/// Schema Introspection Module
///
/// This module introspects the tables the executor works against: their
/// columns, which column is the identity column, and a cached row count.
use crate::core::{LoreError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{Connection, Row};

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid"));

/// Checks that `name` is a plain SQL identifier (table or column) before it is interpolated
/// into statement text.
pub fn validate_identifier(name: &str) -> Result<&str> {
    if IDENTIFIER.is_match(name) {
        Ok(name)
    } else {
        Err(LoreError::validation(format!(
            "`{}` is not a valid identifier",
            name
        )))
    }
}

/// Represents a database column with its metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name
    pub name: String,
    /// Declared type (e.g., "INTEGER", "TEXT"); empty when undeclared
    pub type_name: String,
    /// Whether the column rejects NULL values
    pub notnull: bool,
    /// Whether this column is part of the primary key
    pub pk: bool,
    /// Default value expression (if any)
    pub dflt_value: Option<String>,
}

impl Column {
    /// Creates a Column from a `pragma_table_info` result row
    fn from_pragma_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Column {
            name: row.get(1)?,
            type_name: row.get(2)?,
            notnull: row.get(3)?,
            pk: row.get(5)?,
            dflt_value: row.get(4)?,
        })
    }

    /// A column without a default must be named on insert, even if only
    /// with an explicit NULL.
    pub fn is_required(&self) -> bool {
        self.dflt_value.is_none()
    }
}

/// A table as seen by the statement executor.
#[derive(Debug, Clone)]
pub struct TableDescriptor {
    /// Table name
    pub name: String,
    /// Columns in declaration order
    pub columns: Vec<Column>,
    row_count: Option<u64>,
}

impl TableDescriptor {
    /// Introspects `table_name`. Returns `NotFound` if the table does not exist.
    pub fn introspect(conn: &Connection, table_name: &str) -> Result<Self> {
        validate_identifier(table_name)?;
        let columns = get_table_columns(conn, table_name)?;
        if columns.is_empty() {
            return Err(LoreError::NotFound(format!("table `{}`", table_name)));
        }

        Ok(TableDescriptor {
            name: table_name.to_string(),
            columns,
            row_count: None,
        })
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// The primary-key column, or the first column when none is declared.
    pub fn identity_column(&self) -> &Column {
        self.columns
            .iter()
            .find(|c| c.pk)
            .unwrap_or(&self.columns[0])
    }

    /// Every column except the identity column, in declaration order.
    pub fn insert_columns(&self) -> Vec<&Column> {
        let identity = &self.identity_column().name;
        self.columns
            .iter()
            .filter(|c| &c.name != identity)
            .collect()
    }

    /// Number of rows, counted once and cached until [`invalidate`](Self::invalidate).
    pub fn row_count(&mut self, conn: &Connection) -> Result<u64> {
        if let Some(count) = self.row_count {
            return Ok(count);
        }

        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) AS count FROM {}", self.name),
            [],
            |row| row.get(0),
        )?;
        let count = count as u64;
        self.row_count = Some(count);
        Ok(count)
    }

    pub fn invalidate(&mut self) {
        self.row_count = None;
    }
}

/// Names of all user-defined tables, in creation order.
pub fn table_names(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master
         WHERE type='table' AND name NOT LIKE 'sqlite_%'",
    )?;

    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names)
}

/// Helper function to retrieve column information for a specific table
fn get_table_columns(conn: &Connection, table_name: &str) -> Result<Vec<Column>> {
    let mut columns = Vec::new();

    let mut stmt = conn.prepare("SELECT * FROM pragma_table_info(?1)")?;
    let column_iter = stmt.query_map([table_name], |row| Column::from_pragma_row(row))?;

    for column_result in column_iter {
        columns.push(column_result?);
    }

    Ok(columns)
}
