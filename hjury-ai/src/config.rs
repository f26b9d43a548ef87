//! Configuration resolution for hjury-ai
//!
//! Secrets resolve with Database → ENV → TOML priority; a warning is logged
//! when more than one source is populated.

use hjury_common::config::TomlConfig;
use hjury_common::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Environment variable holding the GitHub API token
pub const GITHUB_TOKEN_ENV: &str = "HJURY_GITHUB_TOKEN";

/// Resolve the GitHub API token
///
/// Returns `None` when no source has a usable value; repository checks then
/// run unauthenticated, with GitHub's lower rate limit.
pub async fn resolve_github_token(
    db: &SqlitePool,
    toml_config: &TomlConfig,
) -> Result<Option<String>> {
    let db_token = crate::db::settings::get_github_token(db)
        .await?
        .filter(|t| is_valid_token(t));
    let env_token = std::env::var(GITHUB_TOKEN_ENV)
        .ok()
        .filter(|t| is_valid_token(t));
    let toml_token = toml_config
        .github_token
        .clone()
        .filter(|t| is_valid_token(t));

    let sources: Vec<&str> = [
        (db_token.is_some(), "database"),
        (env_token.is_some(), "environment"),
        (toml_token.is_some(), "TOML"),
    ]
    .into_iter()
    .filter_map(|(present, name)| present.then_some(name))
    .collect();

    if sources.len() > 1 {
        warn!(
            "GitHub token found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    match sources.first() {
        Some(source) => info!("GitHub token loaded from {}", source),
        None => warn!(
            "No GitHub token configured; repository checks are unauthenticated. Set {} or github_token in hjury-ai.toml",
            GITHUB_TOKEN_ENV
        ),
    }

    Ok(db_token.or(env_token).or(toml_token))
}

/// Non-empty, non-whitespace
pub fn is_valid_token(token: &str) -> bool {
    !token.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::settings::{set_setting, GITHUB_TOKEN_KEY};
    use serial_test::serial;

    async fn pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        crate::db::init_tables(&pool).await.unwrap();
        pool
    }

    fn toml_with_token(token: Option<&str>) -> TomlConfig {
        TomlConfig {
            github_token: token.map(str::to_string),
            ..Default::default()
        }
    }

    #[tokio::test]
    #[serial]
    async fn test_database_wins_over_env_and_toml() {
        let pool = pool().await;
        set_setting(&pool, GITHUB_TOKEN_KEY, "db-token").await.unwrap();
        std::env::set_var(GITHUB_TOKEN_ENV, "env-token");

        let token = resolve_github_token(&pool, &toml_with_token(Some("toml-token")))
            .await
            .unwrap();
        std::env::remove_var(GITHUB_TOKEN_ENV);

        assert_eq!(token.as_deref(), Some("db-token"));
    }

    #[tokio::test]
    #[serial]
    async fn test_env_then_toml_fallback() {
        let pool = pool().await;
        std::env::set_var(GITHUB_TOKEN_ENV, "env-token");
        let token = resolve_github_token(&pool, &toml_with_token(Some("toml-token")))
            .await
            .unwrap();
        assert_eq!(token.as_deref(), Some("env-token"));

        std::env::set_var(GITHUB_TOKEN_ENV, "   ");
        let token = resolve_github_token(&pool, &toml_with_token(Some("toml-token")))
            .await
            .unwrap();
        std::env::remove_var(GITHUB_TOKEN_ENV);
        assert_eq!(token.as_deref(), Some("toml-token"));
    }

    #[tokio::test]
    #[serial]
    async fn test_no_token_configured() {
        let pool = pool().await;
        std::env::remove_var(GITHUB_TOKEN_ENV);
        let token = resolve_github_token(&pool, &toml_with_token(None)).await.unwrap();
        assert!(token.is_none());
    }
}
