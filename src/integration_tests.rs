/// # Integration Tests Module
///
/// End-to-end flows across the condition compiler, the join builder, the
/// executor and record hydration, run against the shared fixtures.

#[cfg(test)]
mod tests {
    use crate::core::db::{Columns, Condition, Join, Key, Scope, SelectQuery, Values};
    use crate::core::{FromValue, LoreError, Result, Value};
    use crate::models::User;
    use crate::record::{FieldSet, Record};
    use crate::store::init_store;
    use crate::test_utils::{DatabaseFixture, PlainHasher};
    use indexmap::IndexMap;

    #[derive(Debug, PartialEq)]
    struct Book {
        book_id: i64,
        title: String,
        author: Option<String>,
    }

    impl Record for Book {
        const TABLE: &'static str = "books";
        const FIELDS: &'static [&'static str] = &["book_id", "title", "author"];
        const RENAME: &'static [(&'static str, &'static str)] = &[
            ("books_id", "book_id"),
            ("books_val", "title"),
            ("authors_val", "author"),
        ];

        fn from_fields(fields: &mut FieldSet) -> Result<Self> {
            Ok(Book {
                book_id: fields.take("book_id")?,
                title: fields.take("title")?,
                author: fields.take_opt("author")?,
            })
        }

        fn field(&self, name: &str) -> Value {
            match name {
                "book_id" => Value::Integer(self.book_id),
                "title" => Value::from(self.title.as_str()),
                "author" => Value::from(self.author.clone()),
                _ => Value::Null,
            }
        }
    }

    fn books_with_authors() -> SelectQuery {
        SelectQuery::from("books")
            .columns(Columns::qualified([
                ("books", "books_id"),
                ("books", "books_val"),
                ("authors0", "authors_val"),
            ]))
            .join(Join::on([("authors", "author_id")]))
    }

    #[test]
    fn test_joined_select_hydrates_records() {
        let fixture = DatabaseFixture::with_sample_data("join_records").unwrap();
        let executor = fixture.executor();

        let books: Vec<Book> = executor.select_as(&books_with_authors()).unwrap();
        assert_eq!(books.len(), 3);
        assert_eq!(books[0].author.as_deref(), Some("Le Guin"));
        assert_eq!(books[1].title, "Dune");
        assert_eq!(books[1].author.as_deref(), Some("Herbert"));
        // LEFT JOIN keeps the book without an author
        assert_eq!(books[2].author, None);
    }

    #[test]
    fn test_joined_select_with_filters() {
        let fixture = DatabaseFixture::with_sample_data("join_filters").unwrap();
        let executor = fixture.executor();

        let recent: Vec<Book> = executor
            .select_as(&books_with_authors().filter(Condition::list(["year", ">", "1970"])))
            .unwrap();
        let titles: Vec<&str> = recent.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["The Dispossessed", "Anonymous Verses"]);

        let by_title = executor
            .select_one_as::<Book>(&books_with_authors().filter("Dune"))
            .unwrap();
        assert_eq!(by_title.book_id, 2);

        let by_id = executor
            .select_one_as::<Book>(&books_with_authors().filter(1))
            .unwrap();
        assert_eq!(by_id.title, "The Dispossessed");
    }

    #[test]
    fn test_grouped_conditions() {
        let fixture = DatabaseFixture::with_sample_data("grouped").unwrap();
        let executor = fixture.executor();

        let mut any: IndexMap<Key, Condition> = IndexMap::new();
        any.insert("books_val".into(), Condition::from("Dune"));
        any.insert(("year", ">").into(), Condition::from("1980"));
        let condition = Condition::map([("OR", Condition::Map(any))]);

        let rows = executor
            .select(&SelectQuery::from("books").columns("books_val").filter(condition))
            .unwrap();
        let titles: Vec<String> = rows
            .into_iter()
            .map(|row| String::from_value(row.values()[0].clone()).unwrap())
            .collect();
        assert_eq!(titles, vec!["Dune", "Anonymous Verses"]);

        let rows = executor
            .select(
                &SelectQuery::from("books")
                    .filter(Condition::map([(("year", "IN"), "1965, 1974")])),
            )
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_join_without_key_is_rejected() {
        let fixture = DatabaseFixture::with_sample_data("join_tables").unwrap();
        let executor = fixture.executor();

        let query = SelectQuery::from("books").join(Join::Tables(vec!["authors".to_string()]));
        assert!(matches!(executor.select(&query), Err(LoreError::Validation(_))));
    }

    #[test]
    fn test_insert_then_select_round_trip() {
        let mut scope = Scope::in_memory();
        let executor = scope.executor().unwrap();
        init_store(&executor, &PlainHasher, "admin").unwrap();

        let mut values = Values::new();
        values.insert("user_val".to_string(), Value::from("picard"));
        values.insert("password".to_string(), Value::from("hashed:engage"));
        let id = executor.insert_as::<User>(User::TABLE, values).unwrap();

        let picard: User = executor
            .select_one_as(&SelectQuery::from(User::TABLE).filter("picard"))
            .unwrap();
        assert_eq!(picard.user_id, Some(id));
        assert_eq!(picard.password, "hashed:engage");

        let mut unknown = Values::new();
        unknown.insert("rank".to_string(), Value::from("captain"));
        assert!(matches!(
            executor.insert_as::<User>(User::TABLE, unknown),
            Err(LoreError::Validation(_))
        ));
    }

    #[test]
    fn test_mutations_through_scope() {
        let mut scope = Scope::in_memory();
        {
            let executor = scope.executor().unwrap();
            init_store(&executor, &PlainHasher, "admin").unwrap();

            assert!(matches!(
                executor.delete(User::TABLE, None),
                Err(LoreError::Validation(_))
            ));
            let deleted = executor
                .delete(User::TABLE, Some(&Condition::from("admin")))
                .unwrap();
            assert_eq!(deleted, 1);
            assert!(executor.select(&SelectQuery::from(User::TABLE)).unwrap().is_empty());
        }
        scope.release().unwrap();
        assert!(!scope.is_open());
    }
}
