//! Database access layer for stats-admin
//!
//! One module per table. All functions take the shared pool and return
//! `stats_common::Result` so constraint violations reach the API layer
//! intact.

pub mod countries;
pub mod sessions;
pub mod sources;
pub mod users;

use stats_common::{Error, Result};

/// Sort direction for list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Parse `asc`/`desc` (case-insensitive); anything else is an error
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        match raw.map(str::to_ascii_lowercase).as_deref() {
            None | Some("") | Some("asc") => Ok(SortOrder::Asc),
            Some("desc") => Ok(SortOrder::Desc),
            Some(other) => Err(Error::InvalidInput(format!(
                "order must be 'asc' or 'desc', got '{}'",
                other
            ))),
        }
    }

    fn sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Validated ORDER BY clause
///
/// The column always comes from a static allow-list, so it is safe to
/// interpolate into SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub column: &'static str,
    pub order: SortOrder,
}

impl Sort {
    /// Resolve a requested sort column against `allowed`
    ///
    /// `None` or blank selects `default`.
    pub fn resolve(
        requested: Option<&str>,
        order: SortOrder,
        allowed: &[&'static str],
        default: &'static str,
    ) -> Result<Self> {
        let column = match requested.map(str::trim).filter(|s| !s.is_empty()) {
            None => default,
            Some(name) => allowed
                .iter()
                .copied()
                .find(|column| *column == name)
                .ok_or_else(|| Error::InvalidInput(format!("cannot sort by '{}'", name)))?,
        };
        Ok(Self { column, order })
    }

    pub(crate) fn order_by(&self) -> String {
        format!("\"{}\" {}", self.column, self.order.sql())
    }
}

#[cfg(test)]
pub(crate) async fn memory_pool() -> sqlx::SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    stats_common::db::init::create_schema(&pool)
        .await
        .expect("Failed to create schema");
    pool
}
