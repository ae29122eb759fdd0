//! Store bootstrap.
use crate::accounts::CredentialHasher;
use crate::core::db::{Condition, QueryExecutor, Values};
use crate::core::{Result, Value};
use crate::models::User;
use crate::record::Record;
use tracing::info;

/// Schema script run by [`init_store`]. Drops and recreates every table.
pub const SCHEMA: &str = include_str!("schema.sql");

/// Login of the administrative account seeded by [`SCHEMA`].
pub const ADMIN_USERNAME: &str = "admin";

/// Runs [`SCHEMA`] and sets the administrative account's password to the
/// digest of `admin_password`.
pub fn init_store(
    executor: &QueryExecutor<'_>,
    hasher: &dyn CredentialHasher,
    admin_password: &str,
) -> Result<()> {
    executor.run_script(SCHEMA)?;

    let mut values = Values::new();
    values.insert("password".to_string(), Value::Text(hasher.hash(admin_password)?));
    executor.update(User::TABLE, &values, &Condition::from(1))?;

    info!(admin = ADMIN_USERNAME, "initialized store");
    Ok(())
}
