//! Source database operations

use sqlx::{Row, SqlitePool};
use stats_common::db::models::Source;
use stats_common::Result;

use super::Sort;
use crate::forms::source::SourceFields;

const SOURCE_COLUMNS: &str = "id, source_id, name, url, institution, type, site_id, \
     national_site_id, regional_site_id, auth_token, country_iso, identifier_prefix, \
     identifier_map_type, identifier_map_regex, identifier_map_replace, \
     identifier_map_filename, updated_at";

fn row_to_source(row: &sqlx::sqlite::SqliteRow) -> Source {
    Source {
        id: row.get("id"),
        source_id: row.get("source_id"),
        name: row.get("name"),
        url: row.get("url"),
        institution: row.get("institution"),
        source_type: row.get("type"),
        site_id: row.get("site_id"),
        national_site_id: row.get("national_site_id"),
        regional_site_id: row.get("regional_site_id"),
        auth_token: row.get("auth_token"),
        country_iso: row.get("country_iso"),
        identifier_prefix: row.get("identifier_prefix"),
        identifier_map_type: row.get("identifier_map_type"),
        identifier_map_regex: row.get("identifier_map_regex"),
        identifier_map_replace: row.get("identifier_map_replace"),
        identifier_map_filename: row.get("identifier_map_filename"),
        updated_at: row.get("updated_at"),
    }
}

/// One page of sources
pub async fn list_sources(pool: &SqlitePool, sort: Sort, limit: i64, offset: i64) -> Result<Vec<Source>> {
    // id as tiebreaker keeps pages stable when the sort column repeats
    let sql = format!(
        "SELECT {} FROM source ORDER BY {}, id LIMIT ? OFFSET ?",
        SOURCE_COLUMNS,
        sort.order_by()
    );
    let rows = sqlx::query(&sql).bind(limit).bind(offset).fetch_all(pool).await?;
    Ok(rows.iter().map(row_to_source).collect())
}

pub async fn count_sources(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM source")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn get_source(pool: &SqlitePool, id: i64) -> Result<Option<Source>> {
    let sql = format!("SELECT {} FROM source WHERE id = ?", SOURCE_COLUMNS);
    let row = sqlx::query(&sql).bind(id).fetch_optional(pool).await?;
    Ok(row.as_ref().map(row_to_source))
}

/// Insert a source, returning its new primary key
pub async fn insert_source(pool: &SqlitePool, fields: &SourceFields) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO source (
            source_id, name, url, institution, type, site_id, national_site_id,
            regional_site_id, auth_token, country_iso, identifier_prefix,
            identifier_map_type, identifier_map_regex, identifier_map_replace,
            identifier_map_filename, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(&fields.source_id)
    .bind(&fields.name)
    .bind(&fields.url)
    .bind(&fields.institution)
    .bind(&fields.source_type)
    .bind(&fields.site_id)
    .bind(&fields.national_site_id)
    .bind(&fields.regional_site_id)
    .bind(&fields.auth_token)
    .bind(&fields.country_iso)
    .bind(&fields.identifier_prefix)
    .bind(fields.identifier_map_type)
    .bind(&fields.identifier_map_regex)
    .bind(&fields.identifier_map_replace)
    .bind(&fields.identifier_map_filename)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Overwrite every writable column of source `id`
///
/// Returns false when no such source exists.
pub async fn update_source(pool: &SqlitePool, id: i64, fields: &SourceFields) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE source SET
            source_id = ?,
            name = ?,
            url = ?,
            institution = ?,
            type = ?,
            site_id = ?,
            national_site_id = ?,
            regional_site_id = ?,
            auth_token = ?,
            country_iso = ?,
            identifier_prefix = ?,
            identifier_map_type = ?,
            identifier_map_regex = ?,
            identifier_map_replace = ?,
            identifier_map_filename = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(&fields.source_id)
    .bind(&fields.name)
    .bind(&fields.url)
    .bind(&fields.institution)
    .bind(&fields.source_type)
    .bind(&fields.site_id)
    .bind(&fields.national_site_id)
    .bind(&fields.regional_site_id)
    .bind(&fields.auth_token)
    .bind(&fields.country_iso)
    .bind(&fields.identifier_prefix)
    .bind(fields.identifier_map_type)
    .bind(&fields.identifier_map_regex)
    .bind(&fields.identifier_map_replace)
    .bind(&fields.identifier_map_filename)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete_source(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM source WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{memory_pool, SortOrder};
    use crate::forms::source::LIST_COLUMNS;

    fn fields(source_id: &str) -> SourceFields {
        SourceFields {
            source_id: source_id.to_string(),
            name: format!("{} repository", source_id),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_roundtrip() {
        let pool = memory_pool().await;
        let mut item = fields("sedici");
        item.source_type = Some("repository".to_string());
        item.identifier_map_type = 1;
        item.identifier_map_regex = Some("^oai:([^:]+):(.+)$".to_string());
        item.identifier_map_replace = Some(r"oai:\1:\2".to_string());

        let id = insert_source(&pool, &item).await.unwrap();
        let stored = get_source(&pool, id).await.unwrap().unwrap();

        assert_eq!(stored.source_id, "sedici");
        assert_eq!(stored.source_type.as_deref(), Some("repository"));
        assert_eq!(stored.identifier_map_type, 1);
        assert_eq!(stored.identifier_map_replace.as_deref(), Some(r"oai:\1:\2"));
        assert_eq!(stored.identifier_map_filename, None);
        assert!(!stored.updated_at.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_country_is_foreign_key_violation() {
        let pool = memory_pool().await;
        let mut item = fields("orphan");
        item.country_iso = Some("ZZ".to_string());

        let err = insert_source(&pool, &item).await.unwrap_err();
        match err {
            stats_common::Error::Database(sqlx::Error::Database(db_err)) => {
                assert!(db_err.is_foreign_key_violation())
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_update_list_delete() {
        let pool = memory_pool().await;
        let a = insert_source(&pool, &fields("b-source")).await.unwrap();
        insert_source(&pool, &fields("a-source")).await.unwrap();

        let mut changed = fields("c-source");
        changed.identifier_map_type = 2;
        changed.identifier_map_filename = Some("/srv/map.csv".to_string());
        assert!(update_source(&pool, a, &changed).await.unwrap());
        assert!(!update_source(&pool, 999, &changed).await.unwrap());

        let sort = Sort::resolve(Some("source_id"), SortOrder::Asc, &LIST_COLUMNS, "source_id").unwrap();
        let listed = list_sources(&pool, sort, 25, 0).await.unwrap();
        let ids: Vec<&str> = listed.iter().map(|s| s.source_id.as_str()).collect();
        assert_eq!(ids, vec!["a-source", "c-source"]);
        assert_eq!(count_sources(&pool).await.unwrap(), 2);

        assert!(delete_source(&pool, a).await.unwrap());
        assert!(!delete_source(&pool, a).await.unwrap());
        assert_eq!(count_sources(&pool).await.unwrap(), 1);
    }
}
