//! Database initialization
//!
//! Opens (creating if necessary) the SQLite database and creates the schema.
//! Every `create_*_table` function is idempotent.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Open the database at `database_url`, creating file and tables if needed
pub async fn init_database(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_millis(5000));

    // Create parent directory if it doesn't exist
    let filename = options.get_filename().to_path_buf();
    let newly_created = !filename.exists();
    if let Some(parent) = filename.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", filename.display());
    } else {
        info!("Opened existing database: {}", filename.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables (idempotent - safe to call multiple times)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_country_table(pool).await?;
    create_source_table(pool).await?;
    create_users_table(pool).await?;
    create_sessions_table(pool).await?;
    Ok(())
}

/// Create the country table
pub async fn create_country_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS country (
            iso TEXT PRIMARY KEY,
            name TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the source table
///
/// `identifier_map_type`: 0 = standard normalization, 1 = regex replace,
/// 2 = file mapping.
pub async fn create_source_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS source (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            source_id TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            url TEXT,
            institution TEXT,
            type TEXT,
            site_id TEXT,
            national_site_id TEXT,
            regional_site_id TEXT,
            auth_token TEXT,
            country_iso TEXT REFERENCES country(iso),
            identifier_prefix TEXT,
            identifier_map_type INTEGER NOT NULL DEFAULT 0,
            identifier_map_regex TEXT,
            identifier_map_replace TEXT,
            identifier_map_filename TEXT,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_source_country ON source(country_iso)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the users table
///
/// `active` may be NULL; NULL and 0 both mean the account is disabled.
pub async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            password_salt TEXT NOT NULL,
            active INTEGER DEFAULT 1,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the server-side session table
///
/// `data` holds the session as a JSON object.
pub async fn create_sessions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            token TEXT PRIMARY KEY,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_schema_is_idempotent() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");

        create_schema(&pool).await.expect("first run");
        create_schema(&pool).await.expect("second run");

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        let names: Vec<&str> = tables.iter().map(|(n,)| n.as_str()).collect();
        assert_eq!(names, vec!["country", "sessions", "source", "users"]);
    }
}
