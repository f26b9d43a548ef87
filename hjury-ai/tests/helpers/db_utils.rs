//! Database Test Utilities
//!
//! Temporary databases and fixture rows for hackathons, projects and reports

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

use hjury_ai::db::{init_database_pool, to_db_timestamp, DATABASE_FILE};
use hjury_ai::services::RepositoryInspector;
use hjury_ai::AppState;
use hjury_common::config::JuryTuning;
use hjury_common::events::EventBus;

/// Owner used by fixtures unless a test needs a second principal
pub const OWNER: &str = "organizer-1";

/// Create temporary test database with all tables
///
/// Returns (TempDir, SqlitePool) - TempDir must be kept alive for duration of test
pub async fn create_test_db() -> Result<(TempDir, SqlitePool)> {
    let temp_dir = TempDir::new()?;
    let pool = init_database_pool(&temp_dir.path().join(DATABASE_FILE)).await?;
    Ok((temp_dir, pool))
}

/// Tuning with no inter-batch pause so tests run fast
pub fn test_tuning() -> JuryTuning {
    JuryTuning {
        batch_delay_ms: 0,
        ..Default::default()
    }
}

pub fn test_state(pool: SqlitePool, inspector: Arc<dyn RepositoryInspector>) -> AppState {
    AppState::new(pool, EventBus::new(64), inspector, test_tuning())
}

pub async fn insert_hackathon(pool: &SqlitePool, owner: &str) -> Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO hackathons (id, owner_id, name) VALUES (?, ?, ?)")
        .bind(id.to_string())
        .bind(owner)
        .bind(format!("Hackathon {}", &id.to_string()[..8]))
        .execute(pool)
        .await?;
    Ok(id)
}

pub async fn insert_category(pool: &SqlitePool, hackathon_id: Uuid, name: &str) -> Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO categories (id, hackathon_id, name) VALUES (?, ?, ?)")
        .bind(id.to_string())
        .bind(hackathon_id.to_string())
        .bind(name)
        .execute(pool)
        .await?;
    Ok(id)
}

/// Project row; submitted an hour ago with a valid public repository by default
#[derive(Debug, Clone)]
pub struct ProjectFixture {
    pub name: String,
    pub github_url: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub category_id: Option<Uuid>,
}

impl ProjectFixture {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            github_url: Some(format!("https://github.com/acme/{}", name.to_lowercase())),
            submitted_at: Some(Utc::now() - chrono::Duration::hours(1)),
            category_id: None,
        }
    }

    pub fn github_url(mut self, url: Option<&str>) -> Self {
        self.github_url = url.map(str::to_string);
        self
    }

    pub fn category(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn unsubmitted(mut self) -> Self {
        self.submitted_at = None;
        self
    }
}

pub async fn insert_project(
    pool: &SqlitePool,
    hackathon_id: Uuid,
    project: ProjectFixture,
) -> Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO projects (id, hackathon_id, category_id, name, github_url, submitted_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(hackathon_id.to_string())
    .bind(project.category_id.map(|c| c.to_string()))
    .bind(&project.name)
    .bind(&project.github_url)
    .bind(project.submitted_at.map(to_db_timestamp))
    .execute(pool)
    .await?;
    Ok(id)
}

pub async fn insert_technology_report(
    pool: &SqlitePool,
    project_id: Uuid,
    status: &str,
    category: Option<&str>,
    confidence: Option<f64>,
    usage_score: Option<f64>,
    created_at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO technology_reports
            (id, project_id, status, category, confidence, usage_score, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(project_id.to_string())
    .bind(status)
    .bind(category)
    .bind(confidence)
    .bind(usage_score)
    .bind(to_db_timestamp(created_at))
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn insert_quality_report(
    pool: &SqlitePool,
    project_id: Uuid,
    status: &str,
    overall_score: Option<f64>,
    richness_score: Option<f64>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO quality_reports
            (id, project_id, status, overall_score, richness_score, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(project_id.to_string())
    .bind(status)
    .bind(overall_score)
    .bind(richness_score)
    .bind(to_db_timestamp(Utc::now()))
    .execute(pool)
    .await?;
    Ok(())
}

/// Insert into `coherence_reports` or `innovation_reports`
pub async fn insert_score_report(
    pool: &SqlitePool,
    table: &str,
    project_id: Uuid,
    status: &str,
    score: Option<f64>,
) -> Result<()> {
    sqlx::query(&format!(
        "INSERT INTO {} (id, project_id, status, score, created_at) VALUES (?, ?, ?, ?, ?)",
        table
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(project_id.to_string())
    .bind(status)
    .bind(score)
    .bind(to_db_timestamp(Utc::now()))
    .execute(pool)
    .await?;
    Ok(())
}
