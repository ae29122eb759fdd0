/// Connection Scope Module
///
/// A [`Scope`] owns at most one SQLite connection for the lifetime of one
/// logical operation (a request, a script run). The connection is opened on
/// first use and closed exactly once when the scope is released or dropped.
/// Scopes are passed explicitly to whatever needs the store; nothing is
/// shared between scopes.

use crate::config::StoreConfig;
use crate::core::db::query::QueryExecutor;
use crate::core::{LoreError, Result};
use rusqlite::Connection;
use std::fs;
use tracing::{info, warn};

/// Lazily opened, exclusively owned connection.
#[derive(Debug)]
pub struct Scope {
    config: StoreConfig,
    connection: Option<Connection>,
}

impl Scope {
    /// Creates a scope; nothing is opened until [`acquire`](Self::acquire).
    pub fn new(config: StoreConfig) -> Self {
        Scope {
            config,
            connection: None,
        }
    }

    pub fn in_memory() -> Self {
        Scope::new(StoreConfig::in_memory())
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the scope's connection, opening it on the first call.
    ///
    /// # Errors
    ///
    /// `Storage` if SQLite cannot open the file, `Io` if its directory
    /// cannot be created.
    pub fn acquire(&mut self) -> Result<&Connection> {
        let connection = match self.connection.take() {
            Some(connection) => connection,
            None => open(&self.config)?,
        };
        Ok(self.connection.insert(connection))
    }

    /// A statement executor over this scope's connection.
    pub fn executor(&mut self) -> Result<QueryExecutor<'_>> {
        Ok(QueryExecutor::new(self.acquire()?))
    }

    /// Checks if the connection has been opened
    pub fn is_open(&self) -> bool {
        self.connection.is_some()
    }

    /// Closes the connection if one was opened. Calling it again, or on a
    /// scope that never acquired, does nothing.
    pub fn release(&mut self) -> Result<()> {
        if let Some(connection) = self.connection.take() {
            info!(path = %self.config.path.display(), "closing store connection");
            connection
                .close()
                .map_err(|(_, e)| LoreError::Storage(e))?;
        }
        Ok(())
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!(error = %e, "failed to close store connection");
        }
    }
}

fn open(config: &StoreConfig) -> Result<Connection> {
    let conn = if config.is_in_memory() {
        Connection::open_in_memory()?
    } else {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Connection::open(&config.path)?
    };

    // Initialize connection with common pragmas
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    info!(path = %config.path.display(), "opened store connection");
    Ok(conn)
}
