//! Server-side session store
//!
//! A session row holds a JSON object keyed by an opaque token. The token is
//! what the browser carries in its cookie.

use serde_json::{json, Map, Value};
use sqlx::SqlitePool;
use stats_common::Result;
use tracing::warn;
use uuid::Uuid;

use crate::session::USER_ID_KEY;

/// Sessions older than this many days no longer authenticate
pub const SESSION_LIFETIME_DAYS: i64 = 31;

fn lifetime_modifier() -> String {
    format!("-{} days", SESSION_LIFETIME_DAYS)
}

/// Create a session for `user_id` and return its token
pub async fn create_session(pool: &SqlitePool, user_id: i64) -> Result<String> {
    let token = Uuid::new_v4().to_string();
    let data = json!({ USER_ID_KEY: user_id });

    store_session_data(pool, &token, &data.to_string()).await?;
    Ok(token)
}

/// Load the data object of session `token`
///
/// Unknown tokens yield `None`, as do expired ones, which are deleted on the
/// way. Stored data that is not a JSON object is logged and treated as an
/// empty session.
pub async fn load_session(pool: &SqlitePool, token: &str) -> Result<Option<Map<String, Value>>> {
    let row: Option<(String, i64)> = sqlx::query_as(
        "SELECT data, created_at < datetime('now', ?) FROM sessions WHERE token = ?",
    )
    .bind(lifetime_modifier())
    .bind(token)
    .fetch_optional(pool)
    .await?;

    let Some((data, expired)) = row else {
        return Ok(None);
    };

    if expired != 0 {
        warn!(
            "Rejected session older than {} days, removing it",
            SESSION_LIFETIME_DAYS
        );
        delete_session(pool, token).await?;
        return Ok(None);
    }

    match serde_json::from_str::<Value>(&data) {
        Ok(Value::Object(map)) => Ok(Some(map)),
        Ok(other) => {
            warn!("Session data is not an object ({}), ignoring", other);
            Ok(Some(Map::new()))
        }
        Err(e) => {
            warn!("Malformed session data, ignoring: {}", e);
            Ok(Some(Map::new()))
        }
    }
}

/// Store raw session data under `token`, replacing any existing row
///
/// A replaced row starts a fresh lifetime.
pub async fn store_session_data(pool: &SqlitePool, token: &str, data: &str) -> Result<()> {
    sqlx::query("INSERT OR REPLACE INTO sessions (token, data) VALUES (?, ?)")
        .bind(token)
        .bind(data)
        .execute(pool)
        .await?;
    Ok(())
}

/// Delete every session past its lifetime, returning how many went
pub async fn purge_expired_sessions(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE created_at < datetime('now', ?)")
        .bind(lifetime_modifier())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_session(pool: &SqlitePool, token: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;

    #[tokio::test]
    async fn test_create_load_delete() {
        let pool = memory_pool().await;
        let token = create_session(&pool, 7).await.unwrap();
        assert_eq!(token.len(), 36);

        let data = load_session(&pool, &token).await.unwrap().unwrap();
        assert_eq!(data.get(USER_ID_KEY), Some(&json!(7)));

        assert!(delete_session(&pool, &token).await.unwrap());
        assert!(load_session(&pool, &token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_data_is_empty_session() {
        let pool = memory_pool().await;
        store_session_data(&pool, "t1", "{not json").await.unwrap();
        store_session_data(&pool, "t2", "[1, 2]").await.unwrap();

        assert!(load_session(&pool, "t1").await.unwrap().unwrap().is_empty());
        assert!(load_session(&pool, "t2").await.unwrap().unwrap().is_empty());
    }

    async fn backdate(pool: &SqlitePool, token: &str, days: i64) {
        sqlx::query("UPDATE sessions SET created_at = datetime('now', ?) WHERE token = ?")
            .bind(format!("-{} days", days))
            .bind(token)
            .execute(pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_expired_session_is_rejected_and_removed() {
        let pool = memory_pool().await;
        let token = create_session(&pool, 7).await.unwrap();
        backdate(&pool, &token, SESSION_LIFETIME_DAYS + 1).await;

        assert!(load_session(&pool, &token).await.unwrap().is_none());

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn test_session_within_lifetime_still_loads() {
        let pool = memory_pool().await;
        let token = create_session(&pool, 7).await.unwrap();
        backdate(&pool, &token, SESSION_LIFETIME_DAYS - 1).await;

        assert!(load_session(&pool, &token).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_purge_keeps_live_sessions() {
        let pool = memory_pool().await;
        let old = create_session(&pool, 1).await.unwrap();
        let fresh = create_session(&pool, 2).await.unwrap();
        backdate(&pool, &old, 40).await;

        assert_eq!(purge_expired_sessions(&pool).await.unwrap(), 1);
        assert!(load_session(&pool, &fresh).await.unwrap().is_some());
        assert_eq!(purge_expired_sessions(&pool).await.unwrap(), 0);
    }
}
