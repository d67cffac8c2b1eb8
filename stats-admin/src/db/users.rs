//! Administrator account operations

use sqlx::{Row, SqlitePool};
use stats_common::auth::{generate_salt, hash_password};
use stats_common::db::models::User;
use stats_common::Result;

/// Stored password material for a username
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user: User,
    pub password_hash: String,
    pub password_salt: String,
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> User {
    // NULL and 0 both mean disabled
    let active: Option<i64> = row.get("active");
    User {
        id: row.get("id"),
        username: row.get("username"),
        active: active.unwrap_or(0) != 0,
    }
}

/// Look up a user by primary key, active or not
pub async fn find_user(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query("SELECT id, username, active FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.as_ref().map(row_to_user))
}

pub async fn find_credentials(pool: &SqlitePool, username: &str) -> Result<Option<Credentials>> {
    let row = sqlx::query(
        "SELECT id, username, active, password_hash, password_salt FROM users WHERE username = ?",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| Credentials {
        user: row_to_user(&row),
        password_hash: row.get("password_hash"),
        password_salt: row.get("password_salt"),
    }))
}

/// Create an active user with a freshly salted password hash
pub async fn create_user(pool: &SqlitePool, username: &str, password: &str) -> Result<i64> {
    let salt = generate_salt();
    let hash = hash_password(&salt, password);

    let result = sqlx::query(
        "INSERT INTO users (username, password_hash, password_salt, active) VALUES (?, ?, ?, 1)",
    )
    .bind(username)
    .bind(&hash)
    .bind(&salt)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Enable or disable an account
pub async fn set_active(pool: &SqlitePool, id: i64, active: Option<bool>) -> Result<bool> {
    let result = sqlx::query("UPDATE users SET active = ? WHERE id = ?")
        .bind(active)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;
    use stats_common::auth::verify_password;

    #[tokio::test]
    async fn test_create_and_find() {
        let pool = memory_pool().await;
        let id = create_user(&pool, "admin", "s3cret").await.unwrap();

        let user = find_user(&pool, id).await.unwrap().unwrap();
        assert_eq!(user.username, "admin");
        assert!(user.active);

        let creds = find_credentials(&pool, "admin").await.unwrap().unwrap();
        assert!(verify_password(&creds.password_salt, &creds.password_hash, "s3cret"));
        assert!(!verify_password(&creds.password_salt, &creds.password_hash, "wrong"));

        assert!(find_credentials(&pool, "nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_null_active_reads_as_inactive() {
        let pool = memory_pool().await;
        let id = create_user(&pool, "admin", "pw").await.unwrap();

        set_active(&pool, id, None).await.unwrap();
        assert!(!find_user(&pool, id).await.unwrap().unwrap().active);

        set_active(&pool, id, Some(true)).await.unwrap();
        assert!(find_user(&pool, id).await.unwrap().unwrap().active);
    }
}
