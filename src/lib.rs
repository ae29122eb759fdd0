// Core infrastructure modules
pub mod core;
pub mod config;

// Domain modules
pub mod accounts;
pub mod models;
pub mod record;
pub mod store;

#[cfg(test)]
pub(crate) mod test_utils;

#[cfg(test)]
mod integration_tests;

pub use crate::core::{LoreError, Result, Value};
