/// Row Module
///
/// One result row paired with its column names.
use crate::core::db::decltype;
use crate::core::{Result, Value};
use indexmap::IndexMap;

/// A hydrated result row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Row { columns, values }
    }

    /// Reads every cell of `row`, converting each by its column's declared
    /// type. `columns` are the statement's column names and `decl_types`
    /// their declared types (`None` for expressions).
    pub fn from_sql_row(
        row: &rusqlite::Row<'_>,
        columns: &[String],
        decl_types: &[Option<String>],
    ) -> rusqlite::Result<Self> {
        let values = (0..columns.len())
            .map(|idx| {
                let decl = decl_types.get(idx).and_then(Option::as_deref);
                row.get_ref(idx)
                    .map(|cell| decltype::convert(decl, Value::from(cell)))
            })
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Row::new(columns.to_vec(), values))
    }

    /// Value of the first column named `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|idx| &self.values[idx])
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn items(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Space-joined values of every column whose name contains "id".
    pub fn id(&self) -> String {
        self.aggregate("id")
    }

    /// Space-joined values of every column whose name contains "val".
    pub fn val(&self) -> String {
        self.aggregate("val")
    }

    fn aggregate(&self, marker: &str) -> String {
        self.items()
            .filter(|(column, _)| column.contains(marker))
            .map(|(_, value)| value.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn to_dict(&self) -> IndexMap<String, Value> {
        self.items()
            .map(|(column, value)| (column.to_string(), value.clone()))
            .collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_dict())?)
    }

    pub fn into_items(self) -> impl Iterator<Item = (String, Value)> {
        self.columns.into_iter().zip(self.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Row {
        Row::new(
            vec![
                "users_id".to_string(),
                "users_val".to_string(),
                "books_id".to_string(),
                "password".to_string(),
            ],
            vec![
                Value::Integer(1),
                Value::from("picard"),
                Value::Integer(7),
                Value::from("digest"),
            ],
        )
    }

    #[test]
    fn test_lookup() {
        let row = sample();
        assert_eq!(row.get("users_val"), Some(&Value::from("picard")));
        assert_eq!(row.get("missing"), None);
        assert_eq!(row.len(), 4);
    }

    #[test]
    fn test_synthetic_aggregates() {
        let row = sample();
        assert_eq!(row.id(), "1 7");
        assert_eq!(row.val(), "picard");
    }

    #[test]
    fn test_to_json_keeps_column_order() {
        let row = sample();
        assert_eq!(
            row.to_json().unwrap(),
            r#"{"users_id":1,"users_val":"picard","books_id":7,"password":"digest"}"#
        );
    }

    #[test]
    fn test_from_sql_row() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let columns = vec!["a".to_string(), "b".to_string()];
        let row = conn
            .query_row("SELECT 1 AS a, NULL AS b", [], |row| {
                Row::from_sql_row(row, &columns, &[None, None])
            })
            .unwrap();
        assert_eq!(row.values(), &[Value::Integer(1), Value::Null]);
    }

    #[test]
    fn test_from_sql_row_converts_declared_types() {
        use chrono::NaiveDate;

        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE log (active BOOLEAN, day DATE, at TIMESTAMP, note TEXT);
             INSERT INTO log VALUES (1, '2364-03-01', '2364-03-01 09:30:00', '2364-03-01');",
        )
        .unwrap();

        let mut stmt = conn.prepare("SELECT * FROM log").unwrap();
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let decl_types: Vec<Option<String>> = stmt
            .columns()
            .iter()
            .map(|c| c.decl_type().map(String::from))
            .collect();
        let row = stmt
            .query_row([], |row| Row::from_sql_row(row, &columns, &decl_types))
            .unwrap();

        let day = NaiveDate::from_ymd_opt(2364, 3, 1).unwrap();
        assert_eq!(row.get("active"), Some(&Value::Boolean(true)));
        assert_eq!(row.get("day"), Some(&Value::Date(day)));
        assert_eq!(
            row.get("at"),
            Some(&Value::Timestamp(day.and_hms_opt(9, 30, 0).unwrap()))
        );
        // TEXT columns stay text even when they look like dates
        assert_eq!(row.get("note"), Some(&Value::from("2364-03-01")));
    }
}
