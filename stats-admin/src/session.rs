//! Session user resolution
//!
//! Maps whatever is stored under `_user_id` in a session to an active user
//! account, or to nobody. Resolution never fails: every rejection is logged
//! and treated as an anonymous request.

use axum::http::{header, HeaderMap};
use serde_json::Value;
use sqlx::SqlitePool;
use stats_common::db::models::User;
use tracing::{debug, warn};

use crate::db::{sessions, users};
use crate::mapping::parse_lenient_int;

/// Cookie carrying the session token
pub const SESSION_COOKIE: &str = "stats_admin_session";

/// Session key holding the authenticated user's primary key
pub const USER_ID_KEY: &str = "_user_id";

/// Coerce a session-stored identifier to an integer primary key
///
/// Integers pass through, finite floats truncate, strings are parsed
/// leniently (whitespace, sign and `_` separators allowed), booleans map to
/// 0/1. Everything else yields `None`.
pub fn coerce_user_id(raw: Option<&Value>) -> Option<i64> {
    match raw? {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => parse_lenient_int(s),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

/// Resolve a raw session identifier to an active user
pub async fn resolve_session_user(pool: &SqlitePool, raw: Option<&Value>) -> Option<User> {
    let Some(id) = coerce_user_id(raw) else {
        warn!("Rejected session user id {:?}: not an integer", raw);
        return None;
    };

    match users::find_user(pool, id).await {
        Ok(Some(user)) if user.active => Some(user),
        Ok(Some(user)) => {
            warn!("Rejected session user {}: account inactive", user.id);
            None
        }
        Ok(None) => {
            warn!("Rejected session user {}: no such user", id);
            None
        }
        Err(e) => {
            warn!("Session user lookup failed for {}: {}", id, e);
            None
        }
    }
}

/// Resolve the user behind a session token
pub async fn resolve_token_user(pool: &SqlitePool, token: &str) -> Option<User> {
    match sessions::load_session(pool, token).await {
        Ok(Some(data)) => resolve_session_user(pool, data.get(USER_ID_KEY)).await,
        Ok(None) => {
            debug!("Unknown session token");
            None
        }
        Err(e) => {
            warn!("Session load failed: {}", e);
            None
        }
    }
}

/// Extract the session token from the request's `Cookie` headers
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value establishing a session
pub fn session_cookie(token: &str) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        token,
        sessions::SESSION_LIFETIME_DAYS * 24 * 60 * 60
    )
}

/// `Set-Cookie` value clearing the session
pub fn expired_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;
    use axum::http::HeaderValue;
    use serde_json::json;

    #[test]
    fn test_coerce_user_id() {
        assert_eq!(coerce_user_id(Some(&json!(5))), Some(5));
        assert_eq!(coerce_user_id(Some(&json!(5.9))), Some(5));
        assert_eq!(coerce_user_id(Some(&json!(" 42 "))), Some(42));
        assert_eq!(coerce_user_id(Some(&json!("1_000"))), Some(1000));
        assert_eq!(coerce_user_id(Some(&json!(true))), Some(1));
        assert_eq!(coerce_user_id(Some(&json!("abc"))), None);
        assert_eq!(coerce_user_id(Some(&json!(""))), None);
        assert_eq!(coerce_user_id(Some(&json!(null))), None);
        assert_eq!(coerce_user_id(Some(&json!([1]))), None);
        assert_eq!(coerce_user_id(Some(&json!({"id": 1}))), None);
        assert_eq!(coerce_user_id(None), None);
    }

    #[tokio::test]
    async fn test_resolve_rejects_garbage_without_error() {
        let pool = memory_pool().await;
        assert!(resolve_session_user(&pool, None).await.is_none());
        assert!(resolve_session_user(&pool, Some(&json!("abc"))).await.is_none());
        assert!(resolve_session_user(&pool, Some(&json!(12345))).await.is_none());
    }

    #[tokio::test]
    async fn test_resolve_active_and_inactive() {
        let pool = memory_pool().await;
        let id = users::create_user(&pool, "admin", "pw").await.unwrap();

        let user = resolve_session_user(&pool, Some(&json!(id.to_string()))).await;
        assert_eq!(user.map(|u| u.username), Some("admin".to_string()));

        users::set_active(&pool, id, Some(false)).await.unwrap();
        assert!(resolve_session_user(&pool, Some(&json!(id))).await.is_none());

        users::set_active(&pool, id, None).await.unwrap();
        assert!(resolve_session_user(&pool, Some(&json!(id))).await.is_none());
    }

    #[tokio::test]
    async fn test_resolve_absorbs_database_errors() {
        let pool = memory_pool().await;
        sqlx::query("DROP TABLE users").execute(&pool).await.unwrap();
        assert!(resolve_session_user(&pool, Some(&json!(1))).await.is_none());
    }

    #[tokio::test]
    async fn test_resolve_token_user() {
        let pool = memory_pool().await;
        let id = users::create_user(&pool, "admin", "pw").await.unwrap();
        let token = sessions::create_session(&pool, id).await.unwrap();

        assert_eq!(resolve_token_user(&pool, &token).await.map(|u| u.id), Some(id));
        assert!(resolve_token_user(&pool, "not-a-token").await.is_none());
    }

    #[test]
    fn test_session_token_from_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; stats_admin_session=abc-123; other=1"),
        );
        assert_eq!(session_token(&headers), Some("abc-123".to_string()));

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("stats_admin_session="));
        assert_eq!(session_token(&headers), None);
        assert_eq!(session_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_cookie_values() {
        assert!(session_cookie("t").starts_with("stats_admin_session=t;"));
        assert!(session_cookie("t").contains("HttpOnly"));
        assert!(expired_session_cookie().contains("Max-Age=0"));
    }
}
