/// Core Module for lorekeeper
///
/// Shared infrastructure for the data-access layer: the error taxonomy, the
/// dynamically typed SQL value, and the database components that compile
/// filters into SQL and hydrate the results.

pub mod db;
pub mod error;
pub mod value;

// Re-export commonly used types for convenience
pub use error::{LoreError, Result};
pub use value::{FromValue, Value};
