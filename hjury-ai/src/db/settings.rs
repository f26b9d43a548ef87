//! Key/value settings stored in the database

use sqlx::SqlitePool;

use hjury_common::Result;

/// Settings key for the GitHub API token
pub const GITHUB_TOKEN_KEY: &str = "github_token";

/// Settings key bounding how long lock contention is retried
pub const MAX_LOCK_WAIT_KEY: &str = "jury_database_max_lock_wait_ms";

const DEFAULT_MAX_LOCK_WAIT_MS: u64 = 5000;

pub async fn get_setting(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    let value = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;
    Ok(value)
}

pub async fn set_setting(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value) VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_github_token(pool: &SqlitePool) -> Result<Option<String>> {
    get_setting(pool, GITHUB_TOKEN_KEY).await
}

/// Lock retry budget in milliseconds (default 5000)
pub async fn max_lock_wait_ms(pool: &SqlitePool) -> Result<u64> {
    let value = get_setting(pool, MAX_LOCK_WAIT_KEY).await?;
    Ok(value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_MAX_LOCK_WAIT_MS))
}
