/// Join Builder Module
///
/// Turns join specifications into `LEFT JOIN` clauses. Every joined table
/// gets an alias of its name plus a running index, so the same table can be
/// joined several times without the aliases colliding.
use crate::core::db::schema::validate_identifier;
use crate::core::{LoreError, Result};
use indexmap::IndexMap;

/// A join specification.
#[derive(Debug, Clone, PartialEq)]
pub enum Join {
    /// table -> column present on both sides
    On(IndexMap<String, String>),
    /// Bare table names. Always rejected: the join column cannot be derived
    /// reliably from the table name.
    Tables(Vec<String>),
}

impl Join {
    pub fn on<I, T, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (T, C)>,
        T: Into<String>,
        C: Into<String>,
    {
        Join::On(
            pairs
                .into_iter()
                .map(|(table, column)| (table.into(), column.into()))
                .collect(),
        )
    }
}

/// Accumulates join clauses for one FROM table.
#[derive(Debug, Clone)]
pub struct JoinBuilder {
    from: String,
    next_index: usize,
    clauses: Vec<String>,
}

impl JoinBuilder {
    pub fn new(from: impl Into<String>) -> Self {
        JoinBuilder {
            from: from.into(),
            next_index: 0,
            clauses: Vec::new(),
        }
    }

    /// Appends one clause per entry of `join`. Aliases continue from the
    /// previous call.
    pub fn join(&mut self, join: &Join) -> Result<&mut Self> {
        let pairs = match join {
            Join::On(pairs) => pairs,
            Join::Tables(tables) => {
                return Err(LoreError::validation(format!(
                    "explicit join key required for {}",
                    tables.join(", ")
                )))
            }
        };

        for (table, on) in pairs {
            validate_identifier(table)?;
            validate_identifier(on)?;
            let alias = format!("{}{}", table, self.next_index);
            self.clauses.push(format!(
                "LEFT JOIN {table} AS {alias} ON {alias}.{on} = {from}.{on}",
                table = table,
                alias = alias,
                on = on,
                from = self.from,
            ));
            self.next_index += 1;
        }
        Ok(self)
    }

    /// Number of aliases handed out so far.
    pub fn len(&self) -> usize {
        self.next_index
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn finish(&self) -> String {
        self.clauses.join(" ")
    }
}

/// Builds the join clauses of a single specification.
pub fn build(from: &str, join: &Join) -> Result<String> {
    let mut builder = JoinBuilder::new(from);
    builder.join(join)?;
    Ok(builder.finish())
}
