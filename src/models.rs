//! Domain records.
use crate::core::{Result, Value};
use crate::record::{FieldSet, Record};

/// A registered account.
///
/// Stored in `users` as `users_id`, `users_val` and `password`; the digest
/// is an opaque string produced by the credential hasher.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub user_id: Option<i64>,
    pub user_val: String,
    pub password: String,
}

impl User {
    /// A user not yet stored; the identity is assigned on insert.
    pub fn new(user_val: impl Into<String>, password: impl Into<String>) -> Self {
        User {
            user_id: None,
            user_val: user_val.into(),
            password: password.into(),
        }
    }
}

impl Record for User {
    const TABLE: &'static str = "users";
    const FIELDS: &'static [&'static str] = &["user_id", "user_val", "password"];
    const RENAME: &'static [(&'static str, &'static str)] =
        &[("users_id", "user_id"), ("users_val", "user_val")];

    fn from_fields(fields: &mut FieldSet) -> Result<Self> {
        Ok(User {
            user_id: fields.take_opt("user_id")?,
            user_val: fields.take("user_val")?,
            password: fields.take("password")?,
        })
    }

    fn field(&self, name: &str) -> Value {
        match name {
            "user_id" => Value::from(self.user_id),
            "user_val" => Value::from(self.user_val.as_str()),
            "password" => Value::from(self.password.as_str()),
            _ => Value::Null,
        }
    }
}
