//! Database connectivity check behind the `check-db` binary

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use stats_common::mask_db_uri;
use std::str::FromStr;
use tracing::debug;

/// Printed when the backend has no `DATABASE()` function
pub const DATABASE_NAME_UNAVAILABLE: &str = "<not available for this dialect>";

/// Outcome of a connectivity check, one printable line per step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbCheckReport {
    pub lines: Vec<String>,
    pub ok: bool,
}

/// Connect to `database_url` and run the probe queries
///
/// Never creates the database. The URI is masked in the first line unless
/// `show_uri` is set. Any connection or query failure ends the check with a
/// `DB check FAILED` line; a missing `DATABASE()` function does not.
pub async fn run_db_check(database_url: &str, show_uri: bool) -> DbCheckReport {
    let shown = if show_uri {
        database_url.to_string()
    } else {
        mask_db_uri(database_url)
    };
    let mut lines = vec![format!("DATABASE_URL={}", shown)];

    let ok = match probe(database_url, &mut lines).await {
        Ok(()) => {
            lines.push("DB check OK".to_string());
            true
        }
        Err(e) => {
            lines.push(format!("DB check FAILED: {}", e));
            false
        }
    };

    DbCheckReport { lines, ok }
}

async fn probe(database_url: &str, lines: &mut Vec<String>) -> Result<(), sqlx::Error> {
    if !database_url.starts_with("sqlite:") {
        return Err(sqlx::Error::Configuration(
            format!("unsupported database URL scheme in {}", mask_db_uri(database_url)).into(),
        ));
    }

    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(false);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    let one: i64 = sqlx::query_scalar("SELECT 1").fetch_one(&pool).await?;
    lines.push(format!("SELECT 1 -> {}", one));

    match sqlx::query_scalar::<_, Option<String>>("SELECT DATABASE()")
        .fetch_one(&pool)
        .await
    {
        Ok(name) => lines.push(format!("DATABASE() -> {}", name.unwrap_or_else(|| "NULL".to_string()))),
        Err(e) => {
            debug!("DATABASE() unavailable: {}", e);
            lines.push(format!("DATABASE() -> {}", DATABASE_NAME_UNAVAILABLE));
        }
    }

    let sources: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM source")
        .fetch_one(&pool)
        .await?;
    lines.push(format!("Source count -> {}", sources));

    let countries: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM country")
        .fetch_one(&pool)
        .await?;
    lines.push(format!("Country count -> {}", countries));

    pool.close().await;
    Ok(())
}
