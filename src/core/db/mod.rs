/// Database Module
///
/// The data-access layer, organized into focused submodules.
///
/// ## Architecture
///
/// Leaves first:
/// - **Coercion** (`coerce.rs`): converts raw text parameters to numbers or lists
/// - **Conditions** (`condition.rs`): compiles filter specifications into WHERE fragments
/// - **Columns** (`columns.rs`) and **Joins** (`join.rs`): SELECT column lists and LEFT JOIN clauses
/// - **Schema Introspection** (`schema.rs`): table columns, identity column, row counts
/// - **Declared Types** (`decltype.rs`): booleans, dates and timestamps by column declaration
/// - **Rows** (`row.rs`): one result row with its column names
/// - **Query Execution** (`query.rs`): assembles, binds and runs statements
/// - **Connection Scope** (`connection.rs`): one lazily opened connection per scope
///
/// ## Error Handling
///
/// All operations use the standardized `LoreError` type for consistent error propagation.
pub mod coerce;
pub mod columns;
pub mod condition;
pub mod connection;
pub mod decltype;
pub mod join;
pub mod query;
pub mod row;
pub mod schema;

pub use coerce::{coerce, Coercer};
pub use columns::Columns;
pub use condition::{compile, compile_where, Clause, Condition, Conjunction, Key};
pub use connection::Scope;
pub use join::{Join, JoinBuilder};
pub use query::{QueryExecutor, SelectQuery, Values};
pub use row::Row;
pub use schema::{Column, TableDescriptor};
