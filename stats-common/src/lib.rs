//! # stats-admin Common Library
//!
//! Shared code for the stats-admin web service and its tooling:
//! - Database schema, initialization and row models
//! - Configuration resolution (database URL, listen port)
//! - Password hashing for administrator accounts
//! - Connection URI masking for diagnostics

pub mod auth;
pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod uri;

pub use error::{Error, Result};
pub use uri::mask_db_uri;
