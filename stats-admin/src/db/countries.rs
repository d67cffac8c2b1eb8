//! Country database operations

use sqlx::{Row, SqlitePool};
use stats_common::db::models::Country;
use stats_common::Result;

use super::Sort;
use crate::forms::country::CountryFields;

fn row_to_country(row: &sqlx::sqlite::SqliteRow) -> Country {
    Country {
        iso: row.get("iso"),
        name: row.get("name"),
    }
}

/// One page of countries
pub async fn list_countries(pool: &SqlitePool, sort: Sort, limit: i64, offset: i64) -> Result<Vec<Country>> {
    let sql = format!(
        "SELECT iso, name FROM country ORDER BY {} LIMIT ? OFFSET ?",
        sort.order_by()
    );
    let rows = sqlx::query(&sql).bind(limit).bind(offset).fetch_all(pool).await?;
    Ok(rows.iter().map(row_to_country).collect())
}

pub async fn count_countries(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM country")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn get_country(pool: &SqlitePool, iso: &str) -> Result<Option<Country>> {
    let row = sqlx::query("SELECT iso, name FROM country WHERE iso = ?")
        .bind(iso)
        .fetch_optional(pool)
        .await?;
    Ok(row.as_ref().map(row_to_country))
}

pub async fn country_exists(pool: &SqlitePool, iso: &str) -> Result<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM country WHERE iso = ?")
        .bind(iso)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

/// Number of sources referencing `iso`
pub async fn count_country_sources(pool: &SqlitePool, iso: &str) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM source WHERE country_iso = ?")
        .bind(iso)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn insert_country(pool: &SqlitePool, fields: &CountryFields) -> Result<()> {
    sqlx::query("INSERT INTO country (iso, name) VALUES (?, ?)")
        .bind(&fields.iso)
        .bind(&fields.name)
        .execute(pool)
        .await?;
    Ok(())
}

/// Update the country keyed by `iso`; returns false when it does not exist
///
/// The key itself may change. Renaming a key still referenced by sources
/// fails with a foreign key violation.
pub async fn update_country(pool: &SqlitePool, iso: &str, fields: &CountryFields) -> Result<bool> {
    let result = sqlx::query("UPDATE country SET iso = ?, name = ? WHERE iso = ?")
        .bind(&fields.iso)
        .bind(&fields.name)
        .bind(iso)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_country(pool: &SqlitePool, iso: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM country WHERE iso = ?")
        .bind(iso)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
