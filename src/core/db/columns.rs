/// Column Resolver Module
///
/// Normalizes a column specification into the column list of a SELECT.
use crate::core::{LoreError, Result};
use indexmap::IndexMap;

/// Columns to select.
#[derive(Debug, Clone, PartialEq)]
pub enum Columns {
    /// Pre-formatted column text, used unchanged (including `*`)
    Raw(String),
    /// (table, column) pairs, rendered as `` `table`.column `` to
    /// disambiguate joins. A table may appear more than once.
    Qualified(Vec<(String, String)>),
    /// Column names, comma-joined as given
    List(Vec<String>),
}

impl Columns {
    pub fn all() -> Self {
        Columns::Raw("*".to_string())
    }

    pub fn qualified<I, T, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (T, C)>,
        T: Into<String>,
        C: Into<String>,
    {
        Columns::Qualified(
            pairs
                .into_iter()
                .map(|(table, column)| (table.into(), column.into()))
                .collect(),
        )
    }
}

impl Default for Columns {
    fn default() -> Self {
        Columns::all()
    }
}

impl From<&str> for Columns {
    fn from(columns: &str) -> Self {
        Columns::Raw(columns.to_string())
    }
}

/// One column per table, in insertion order.
impl From<IndexMap<String, String>> for Columns {
    fn from(columns: IndexMap<String, String>) -> Self {
        Columns::Qualified(columns.into_iter().collect())
    }
}

impl From<Vec<&str>> for Columns {
    fn from(columns: Vec<&str>) -> Self {
        Columns::List(columns.into_iter().map(String::from).collect())
    }
}

impl From<Vec<String>> for Columns {
    fn from(columns: Vec<String>) -> Self {
        Columns::List(columns)
    }
}

/// Renders `columns` as SELECT column text.
pub fn resolve(columns: &Columns) -> Result<String> {
    let text = match columns {
        Columns::Raw(text) => text.clone(),
        Columns::Qualified(pairs) => pairs
            .iter()
            .map(|(table, column)| format!("`{}`.{}", table, column))
            .collect::<Vec<_>>()
            .join(", "),
        Columns::List(names) => names.join(", "),
    };

    if text.trim().is_empty() {
        return Err(LoreError::validation("column specification is empty"));
    }
    Ok(text)
}
