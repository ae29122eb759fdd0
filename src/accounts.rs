//! Account registration and login on top of the statement executor.
//!
//! Password hashing is supplied by the caller through [`CredentialHasher`];
//! this crate only stores and reads back the digest.
use crate::core::db::{QueryExecutor, SelectQuery};
use crate::core::{FromValue, LoreError, Result};
use crate::models::User;
use crate::record::Record;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

/// Usernames always start with a letter and contain no separator or
/// comparison characters, so they compile to a bound `users_val = ?`.
static USERNAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_.-]{0,63}$").expect("username pattern is valid"));

/// Hashes and verifies credentials.
pub trait CredentialHasher {
    fn hash(&self, plaintext: &str) -> Result<String>;
    fn verify(&self, digest: &str, plaintext: &str) -> Result<bool>;
}

/// Trims and lowercases `username`, then checks its shape.
pub fn normalize_username(username: &str) -> Result<String> {
    let username = username.trim().to_lowercase();
    if USERNAME.is_match(&username) {
        Ok(username)
    } else {
        Err(LoreError::validation(format!(
            "'{}' is not a valid username",
            username
        )))
    }
}

/// User registration and lookup.
pub struct Accounts<'a> {
    executor: QueryExecutor<'a>,
    hasher: &'a dyn CredentialHasher,
}

impl<'a> Accounts<'a> {
    pub fn new(executor: QueryExecutor<'a>, hasher: &'a dyn CredentialHasher) -> Self {
        Accounts { executor, hasher }
    }

    /// Registers a new user and returns it with its assigned id.
    ///
    /// The existence check and the insert are separate statements; the
    /// UNIQUE constraint on `users_val` is what actually prevents two
    /// concurrent registrations of the same name, and a violation of it is
    /// reported as `Duplicate` as well.
    pub fn register(&self, username: &str, password: &str) -> Result<User> {
        let username = normalize_username(username)?;
        let password = password.trim();
        if password.is_empty() {
            return Err(LoreError::validation("must include password"));
        }
        if self.username_exists(&username)? {
            return Err(duplicate(&username));
        }

        let mut user = User::new(username, self.hasher.hash(password)?);
        let id = self
            .executor
            .insert_record(User::TABLE, &user)
            .map_err(|e| {
                if e.is_unique_violation() {
                    duplicate(&user.user_val)
                } else {
                    e
                }
            })?;
        user.user_id = Some(id);

        info!(user = %user.user_val, id, "registered user");
        Ok(user)
    }

    /// Looks up `username` and checks `password` against its digest.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<User> {
        let user = self.user_by_name(username)?;
        if self.hasher.verify(&user.password, password.trim())? {
            Ok(user)
        } else {
            Err(LoreError::validation("password is incorrect"))
        }
    }

    pub fn user_by_id(&self, user_id: i64) -> Result<User> {
        self.executor
            .select_one_as(&SelectQuery::from(User::TABLE).filter(user_id))
    }

    pub fn user_by_name(&self, username: &str) -> Result<User> {
        let username = normalize_username(username)?;
        self.executor
            .select_one_as(&SelectQuery::from(User::TABLE).filter(username.as_str()))
            .map_err(|e| match e {
                LoreError::NotFound(_) => {
                    LoreError::NotFound(format!("user '{}' doesn't exist", username))
                }
                other => other,
            })
    }

    pub fn username_exists(&self, username: &str) -> Result<bool> {
        let username = normalize_username(username)?;
        let rows = self.executor.select(
            &SelectQuery::from(User::TABLE)
                .columns(vec!["users_val"])
                .filter(username.as_str()),
        )?;
        Ok(!rows.is_empty())
    }

    /// Every username, in registration order.
    pub fn usernames(&self) -> Result<Vec<String>> {
        self.executor
            .select(
                &SelectQuery::from(User::TABLE)
                    .columns(vec!["users_val"])
                    .order_by("users_id"),
            )?
            .into_iter()
            .flat_map(|row| row.into_items().map(|(_, value)| String::from_value(value)))
            .collect()
    }
}

fn duplicate(username: &str) -> LoreError {
    LoreError::Duplicate(format!("user '{}' already exists", username))
}
