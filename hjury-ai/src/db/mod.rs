//! Database access for hjury-ai
//!
//! SQLite via sqlx. Project and report tables are owned by the wider
//! hackathon platform; they are created here only so the service can run
//! standalone and under test.

pub mod candidates;
pub mod layer_results;
pub mod sessions;
pub mod settings;

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "hjury.db";

/// Initialize database connection pool and create tables
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_millis(2000));

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create all tables used by the jury if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> hjury_common::Result<()> {
    const STATEMENTS: &[&str] = &[
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS hackathons (
            id TEXT PRIMARY KEY,
            owner_id TEXT NOT NULL,
            name TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id TEXT PRIMARY KEY,
            hackathon_id TEXT NOT NULL REFERENCES hackathons(id) ON DELETE CASCADE,
            name TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS projects (
            id TEXT PRIMARY KEY,
            hackathon_id TEXT NOT NULL REFERENCES hackathons(id) ON DELETE CASCADE,
            category_id TEXT REFERENCES categories(id) ON DELETE SET NULL,
            name TEXT NOT NULL,
            github_url TEXT,
            submitted_at TEXT
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS technology_reports (
            id TEXT PRIMARY KEY,
            project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            status TEXT NOT NULL,
            category TEXT,
            confidence REAL,
            usage_score REAL,
            created_at TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS quality_reports (
            id TEXT PRIMARY KEY,
            project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            status TEXT NOT NULL,
            overall_score REAL,
            richness_score REAL,
            created_at TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS coherence_reports (
            id TEXT PRIMARY KEY,
            project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            status TEXT NOT NULL,
            score REAL,
            created_at TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS innovation_reports (
            id TEXT PRIMARY KEY,
            project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            status TEXT NOT NULL,
            score REAL,
            created_at TEXT NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS jury_sessions (
            id TEXT PRIMARY KEY,
            hackathon_id TEXT NOT NULL REFERENCES hackathons(id) ON DELETE CASCADE,
            owner_id TEXT NOT NULL,
            status TEXT NOT NULL,
            current_layer INTEGER NOT NULL DEFAULT 1,
            total_layers INTEGER NOT NULL DEFAULT 4,
            total_candidates INTEGER NOT NULL DEFAULT 0,
            eliminated_count INTEGER NOT NULL DEFAULT 0,
            eligibility_criteria TEXT NOT NULL DEFAULT '{}',
            final_results TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            completed_at TEXT
        )
        "#,
        // At most one non-terminal session per hackathon
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_jury_sessions_active
        ON jury_sessions(hackathon_id)
        WHERE status NOT IN ('COMPLETED', 'FAILED')
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS jury_layer_results (
            session_id TEXT NOT NULL REFERENCES jury_sessions(id) ON DELETE CASCADE,
            layer INTEGER NOT NULL,
            candidate_id TEXT NOT NULL,
            eliminated INTEGER NOT NULL,
            score INTEGER,
            reason TEXT NOT NULL,
            evidence TEXT NOT NULL,
            processed_at TEXT NOT NULL,
            PRIMARY KEY (session_id, layer, candidate_id)
        )
        "#,
    ];

    for statement in STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }

    tracing::info!("Database tables initialized");

    Ok(())
}

/// Fixed-width UTC timestamp so TEXT ordering matches time ordering
pub fn to_db_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(column: &str, value: &str) -> hjury_common::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            hjury_common::Error::Internal(format!("Failed to parse {}: {}", column, e))
        })
}

pub(crate) fn parse_optional_timestamp(
    column: &str,
    value: Option<String>,
) -> hjury_common::Result<Option<DateTime<Utc>>> {
    value.map(|v| parse_timestamp(column, &v)).transpose()
}

pub(crate) fn parse_uuid(column: &str, value: &str) -> hjury_common::Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| hjury_common::Error::Internal(format!("Failed to parse {}: {}", column, e)))
}
