//! Test fixtures shared by the unit and integration tests.
use crate::accounts::CredentialHasher;
use crate::core::db::QueryExecutor;
use crate::core::Result;
use rusqlite::Connection;

/// An in-memory database with a known schema.
pub struct DatabaseFixture {
    pub name: String,
    pub connection: Connection,
}

impl DatabaseFixture {
    /// Creates an empty in-memory database.
    pub fn new(name: &str) -> Result<Self> {
        let connection = Connection::open_in_memory()?;
        connection.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(DatabaseFixture {
            name: name.to_string(),
            connection,
        })
    }

    /// Creates the sample schema and fills it with a few rows.
    ///
    /// Users are inserted in the order picard, riker, data, so their ids are
    /// 1, 2 and 3.
    pub fn with_sample_data(name: &str) -> Result<Self> {
        let fixture = Self::new(name)?;
        fixture.create_schema()?;
        fixture.populate_sample_data()?;
        Ok(fixture)
    }

    pub fn executor(&self) -> QueryExecutor<'_> {
        QueryExecutor::new(&self.connection)
    }

    fn create_schema(&self) -> Result<()> {
        self.connection.execute_batch(
            "
            CREATE TABLE users (
                users_id INTEGER PRIMARY KEY AUTOINCREMENT,
                users_val TEXT UNIQUE NOT NULL,
                password TEXT NOT NULL
            );

            CREATE TABLE authors (
                authors_id INTEGER PRIMARY KEY AUTOINCREMENT,
                authors_val TEXT NOT NULL,
                author_id INTEGER UNIQUE
            );

            CREATE TABLE books (
                books_id INTEGER PRIMARY KEY AUTOINCREMENT,
                books_val TEXT NOT NULL,
                author_id INTEGER,
                year INTEGER
            );
            ",
        )?;
        Ok(())
    }

    fn populate_sample_data(&self) -> Result<()> {
        for name in ["picard", "riker", "data"] {
            self.connection.execute(
                "INSERT INTO users (users_val, password) VALUES (?1, ?2)",
                rusqlite::params![name, format!("hashed:{}", name)],
            )?;
        }

        for (name, key) in [("Le Guin", 10), ("Herbert", 20)] {
            self.connection.execute(
                "INSERT INTO authors (authors_val, author_id) VALUES (?1, ?2)",
                rusqlite::params![name, key],
            )?;
        }

        let books = [
            ("The Dispossessed", Some(10), 1974),
            ("Dune", Some(20), 1965),
            ("Anonymous Verses", None, 1987),
        ];
        for (title, author, year) in books {
            self.connection.execute(
                "INSERT INTO books (books_val, author_id, year) VALUES (?1, ?2, ?3)",
                rusqlite::params![title, author, year],
            )?;
        }

        Ok(())
    }
}

/// Stores the plaintext behind a fixed prefix; only fit for tests.
pub struct PlainHasher;

impl CredentialHasher for PlainHasher {
    fn hash(&self, plaintext: &str) -> Result<String> {
        Ok(format!("hashed:{}", plaintext))
    }

    fn verify(&self, digest: &str, plaintext: &str) -> Result<bool> {
        Ok(digest == format!("hashed:{}", plaintext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_fixture_creation() {
        let fixture = DatabaseFixture::new("test_create").unwrap();
        assert_eq!(fixture.name, "test_create");
        assert!(fixture.executor().table_names().unwrap().is_empty());
    }

    #[test]
    fn test_sample_data_fixture() {
        let fixture = DatabaseFixture::with_sample_data("test_sample").unwrap();
        assert_eq!(
            fixture.executor().table_names().unwrap(),
            vec!["users", "authors", "books"]
        );

        let count: i64 = fixture
            .connection
            .query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))
            .expect("Failed to count books");
        assert_eq!(count, 3);
    }

    #[test]
    fn test_plain_hasher() {
        let digest = PlainHasher.hash("engage").unwrap();
        assert!(PlainHasher.verify(&digest, "engage").unwrap());
        assert!(!PlainHasher.verify(&digest, "make it so").unwrap());
    }
}
