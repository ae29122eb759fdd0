/// Query Execution Module
///
/// Assembles SELECT/INSERT/UPDATE/DELETE statements from the column, join
/// and condition components, binds their parameters and runs them against a
/// connection. Every mutating call commits before it returns; there is no
/// transaction spanning several calls.
use crate::core::db::columns::{resolve, Columns};
use crate::core::db::condition::{compile_where, Condition};
use crate::core::db::join::{Join, JoinBuilder};
use crate::core::db::row::Row;
use crate::core::db::schema::{self, validate_identifier, TableDescriptor};
use crate::core::{LoreError, Result, Value};
use crate::record::Record;
use indexmap::IndexMap;
use rusqlite::{params_from_iter, Connection};
use tracing::{debug, info, trace};

/// Column (or field) name -> value, in insertion order.
pub type Values = IndexMap<String, Value>;

/// Describes a SELECT statement.
#[derive(Debug, Clone)]
pub struct SelectQuery {
    table: String,
    columns: Columns,
    joins: Vec<Join>,
    filter: Option<Condition>,
    order_by: Vec<String>,
}

impl SelectQuery {
    /// `SELECT * FROM {table}`
    pub fn from(table: impl Into<String>) -> Self {
        SelectQuery {
            table: table.into(),
            columns: Columns::default(),
            joins: Vec::new(),
            filter: None,
            order_by: Vec::new(),
        }
    }

    pub fn columns(mut self, columns: impl Into<Columns>) -> Self {
        self.columns = columns.into();
        self
    }

    /// Adds joins. Aliases are numbered across every call on this query.
    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    pub fn filter(mut self, condition: impl Into<Condition>) -> Self {
        self.filter = Some(condition.into());
        self
    }

    /// Sorts ascending by `column`, after any earlier sort columns. Without
    /// one, SQLite may return rows in whatever order its plan visits them.
    pub fn order_by(mut self, column: impl Into<String>) -> Self {
        self.order_by.push(column.into());
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Renders the statement text and its bound parameters.
    pub fn to_sql(&self) -> Result<(String, Vec<Value>)> {
        let table = validate_identifier(&self.table)?;
        let columns = resolve(&self.columns)?;

        let mut joins = JoinBuilder::new(table);
        for join in &self.joins {
            joins.join(join)?;
        }

        let mut sql = format!("SELECT {} FROM {}", columns, table);
        if !joins.is_empty() {
            sql.push(' ');
            sql.push_str(&joins.finish());
        }

        let mut params = Vec::new();
        if let Some(filter) = &self.filter {
            let clause = compile_where(table, filter)?;
            if !clause.is_empty() {
                sql.push_str(" WHERE ");
                sql.push_str(&clause.text);
                params = clause.params;
            }
        }

        if !self.order_by.is_empty() {
            let columns = self
                .order_by
                .iter()
                .map(|column| validate_identifier(column))
                .collect::<Result<Vec<_>>>()?;
            sql.push_str(" ORDER BY ");
            sql.push_str(&columns.join(", "));
        }

        Ok((sql, params))
    }
}

/// Statement execution service that operates on a database connection
pub struct QueryExecutor<'a> {
    connection: &'a Connection,
}

impl<'a> QueryExecutor<'a> {
    /// Creates a new QueryExecutor for the given connection
    pub fn new(connection: &'a Connection) -> Self {
        QueryExecutor { connection }
    }

    pub fn connection(&self) -> &'a Connection {
        self.connection
    }

    /// Runs `query` and returns every row.
    ///
    /// # Errors
    ///
    /// `Validation` for a malformed column, join or condition specification;
    /// `Storage` when SQLite rejects the statement.
    pub fn select(&self, query: &SelectQuery) -> Result<Vec<Row>> {
        let (sql, params) = query.to_sql()?;
        self.run_query(&sql, &params)
    }

    /// Runs a caller-written statement and returns every row, each cell
    /// converted by its column's declared type.
    ///
    /// `sql` is executed as given; only `params` are bound.
    pub fn run_query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        debug!(sql = %sql, params = params.len(), "query");

        let mut stmt = self.connection.prepare(sql)?;
        let (columns, decl_types): (Vec<String>, Vec<Option<String>>) = stmt
            .columns()
            .iter()
            .map(|c| (c.name().to_string(), c.decl_type().map(String::from)))
            .unzip();
        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                Row::from_sql_row(row, &columns, &decl_types)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    /// [`run_query`](Self::run_query), hydrating every row into `R`.
    pub fn run_query_as<R: Record>(&self, sql: &str, params: &[Value]) -> Result<Vec<R>> {
        self.run_query(sql, params)?.iter().map(R::from_row).collect()
    }

    /// Runs `query` and hydrates every row into `R`.
    pub fn select_as<R: Record>(&self, query: &SelectQuery) -> Result<Vec<R>> {
        self.select(query)?.iter().map(R::from_row).collect()
    }

    /// Returns the first row of `query`, or `NotFound` when there is none.
    pub fn select_one(&self, query: &SelectQuery) -> Result<Row> {
        self.select(query)?
            .into_iter()
            .next()
            .ok_or_else(|| LoreError::NotFound(format!("no matching row in `{}`", query.table())))
    }

    pub fn select_one_as<R: Record>(&self, query: &SelectQuery) -> Result<R> {
        R::from_row(&self.select_one(query)?)
    }

    /// Inserts one row and returns its rowid.
    ///
    /// `values` is projected onto the table's columns, identity column
    /// excluded. Every column without a default must have a key in `values`
    /// (an explicit `Value::Null` is accepted); a missing one is a
    /// `Validation` error. Columns with a default may be left out. Keys that
    /// name no insertable column are ignored.
    pub fn insert(&self, table: &str, values: &Values) -> Result<i64> {
        let descriptor = TableDescriptor::introspect(self.connection, table)?;

        let mut columns = Vec::new();
        let mut params = Vec::new();
        for column in descriptor.insert_columns() {
            match values.get(&column.name) {
                Some(value) => {
                    columns.push(column.name.as_str());
                    params.push(value.clone());
                }
                None if column.is_required() => {
                    return Err(LoreError::validation(format!(
                        "missing value for required column `{}` of `{}`",
                        column.name, table
                    )))
                }
                None => {}
            }
        }

        for key in values.keys() {
            if !columns.contains(&key.as_str()) {
                trace!(table, column = %key, "ignoring value outside the insert columns");
            }
        }

        let sql = if columns.is_empty() {
            format!("INSERT INTO `{}` DEFAULT VALUES", table)
        } else {
            format!(
                "INSERT INTO `{}` ({}) VALUES ({})",
                table,
                columns.join(", "),
                vec!["?"; columns.len()].join(", ")
            )
        };

        self.execute_mutation(&sql, &params)?;
        Ok(self.connection.last_insert_rowid())
    }

    /// Builds an `R` from field-keyed `values`, then inserts it through
    /// `R`'s rename table.
    pub fn insert_as<R: Record>(&self, table: &str, values: Values) -> Result<i64> {
        let record = R::from_values(values)?;
        self.insert_record(table, &record)
    }

    pub fn insert_record<R: Record>(&self, table: &str, record: &R) -> Result<i64> {
        self.insert(table, &record.column_values())
    }

    /// `UPDATE {table} SET ... WHERE ...`; returns the number of changed rows.
    ///
    /// Both `values` and the compiled condition must be non-empty.
    pub fn update(&self, table: &str, values: &Values, condition: &Condition) -> Result<usize> {
        validate_identifier(table)?;
        if values.is_empty() {
            return Err(LoreError::validation(format!(
                "update of `{}` has no values",
                table
            )));
        }

        let clause = compile_where(table, condition)?;
        if clause.is_empty() {
            return Err(LoreError::validation(format!(
                "update of `{}` requires a non-empty condition",
                table
            )));
        }

        let assignments = values
            .keys()
            .map(|column| validate_identifier(column).map(|c| format!("{} = ?", c)))
            .collect::<Result<Vec<_>>>()?;

        let sql = format!(
            "UPDATE `{}` SET {} WHERE {}",
            table,
            assignments.join(", "),
            clause.text
        );
        let params: Vec<Value> = values.values().cloned().chain(clause.params).collect();

        self.execute_mutation(&sql, &params)
    }

    /// `DELETE FROM {table} WHERE ...`; returns the number of deleted rows.
    ///
    /// A missing or empty condition is rejected before anything runs.
    pub fn delete(&self, table: &str, condition: Option<&Condition>) -> Result<usize> {
        validate_identifier(table)?;
        let condition = condition.ok_or_else(|| {
            LoreError::validation(format!("delete from `{}` requires a condition", table))
        })?;

        let clause = compile_where(table, condition)?;
        if clause.is_empty() {
            return Err(LoreError::validation(format!(
                "delete from `{}` requires a non-empty condition",
                table
            )));
        }

        let sql = format!("DELETE FROM {} WHERE {}", table, clause.text);
        self.execute_mutation(&sql, &clause.params)
    }

    /// Executes `script` verbatim (schema bootstrap).
    pub fn run_script(&self, script: &str) -> Result<()> {
        info!(bytes = script.len(), "running script");
        self.connection.execute_batch(script)?;
        Ok(())
    }

    /// Introspects `table`.
    pub fn table(&self, table: &str) -> Result<TableDescriptor> {
        TableDescriptor::introspect(self.connection, table)
    }

    pub fn table_names(&self) -> Result<Vec<String>> {
        schema::table_names(self.connection)
    }

    /// Every user table, introspected, keyed by name in creation order.
    pub fn table_map(&self) -> Result<IndexMap<String, TableDescriptor>> {
        self.table_names()?
            .into_iter()
            .map(|name| {
                let descriptor = TableDescriptor::introspect(self.connection, &name)?;
                Ok((name, descriptor))
            })
            .collect()
    }

    fn execute_mutation(&self, sql: &str, params: &[Value]) -> Result<usize> {
        debug!(sql = %sql, params = params.len(), "execute");

        let tx = self.connection.unchecked_transaction()?;
        let changed = tx.execute(sql, params_from_iter(params.iter()))?;
        tx.commit()?;

        Ok(changed)
    }
}
