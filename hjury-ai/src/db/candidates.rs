//! Read-only access to hackathon projects and their analysis reports

use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use uuid::Uuid;

use hjury_common::Result;

use super::{parse_optional_timestamp, parse_timestamp, parse_uuid};
use crate::models::candidate::keep_latest;
use crate::models::{Candidate, CandidateReports, QualityReport, ScoreReport, TechnologyReport};

/// Owner of a hackathon, if it exists
pub async fn hackathon_owner(pool: &SqlitePool, hackathon_id: Uuid) -> Result<Option<String>> {
    let owner = sqlx::query_scalar("SELECT owner_id FROM hackathons WHERE id = ?")
        .bind(hackathon_id.to_string())
        .fetch_optional(pool)
        .await?;
    Ok(owner)
}

/// Number of projects in a hackathon
pub async fn count_candidates(pool: &SqlitePool, hackathon_id: Uuid) -> Result<usize> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM projects WHERE hackathon_id = ?")
        .bind(hackathon_id.to_string())
        .fetch_one(pool)
        .await?;
    Ok(count.max(0) as usize)
}

/// Every project of a hackathon with the latest report of each kind
pub async fn load_candidates(pool: &SqlitePool, hackathon_id: Uuid) -> Result<Vec<Candidate>> {
    let hackathon_key = hackathon_id.to_string();
    let mut reports = load_reports(pool, &hackathon_key).await?;

    let rows = sqlx::query(
        r#"
        SELECT p.id, p.name, p.github_url, p.submitted_at, p.category_id,
               c.name AS category_name
        FROM projects p
        LEFT JOIN categories c ON c.id = p.category_id
        WHERE p.hackathon_id = ?
        ORDER BY p.name, p.id
        "#,
    )
    .bind(&hackathon_key)
    .fetch_all(pool)
    .await?;

    let mut candidates = Vec::with_capacity(rows.len());
    for row in rows {
        let id: String = row.try_get("id")?;
        let id = parse_uuid("projects.id", &id)?;
        let category_id: Option<String> = row.try_get("category_id")?;

        candidates.push(Candidate {
            id,
            hackathon_id,
            name: row.try_get("name")?,
            github_url: row.try_get("github_url")?,
            submitted_at: parse_optional_timestamp("submitted_at", row.try_get("submitted_at")?)?,
            category_id: category_id
                .map(|c| parse_uuid("projects.category_id", &c))
                .transpose()?,
            category_name: row.try_get("category_name")?,
            reports: reports.remove(&id).unwrap_or_default(),
        });
    }

    Ok(candidates)
}

/// Latest report per kind for every project of the hackathon
async fn load_reports(
    pool: &SqlitePool,
    hackathon_key: &str,
) -> Result<HashMap<Uuid, CandidateReports>> {
    let mut by_project: HashMap<Uuid, CandidateReports> = HashMap::new();

    let rows = sqlx::query(
        r#"
        SELECT r.id, r.project_id, r.status, r.category, r.confidence, r.usage_score, r.created_at
        FROM technology_reports r
        JOIN projects p ON p.id = r.project_id
        WHERE p.hackathon_id = ?
        "#,
    )
    .bind(hackathon_key)
    .fetch_all(pool)
    .await?;
    for row in rows {
        let project_id = project_id(&row)?;
        let category: Option<String> = row.try_get("category")?;
        let report = TechnologyReport {
            id: report_id(&row)?,
            status: status(&row)?,
            category: category.map(|c| c.parse()).transpose()?,
            confidence: row.try_get("confidence")?,
            usage_score: row.try_get("usage_score")?,
            created_at: created_at(&row)?,
        };
        keep_latest(&mut by_project.entry(project_id).or_default().technology, report);
    }

    let rows = sqlx::query(
        r#"
        SELECT r.id, r.project_id, r.status, r.overall_score, r.richness_score, r.created_at
        FROM quality_reports r
        JOIN projects p ON p.id = r.project_id
        WHERE p.hackathon_id = ?
        "#,
    )
    .bind(hackathon_key)
    .fetch_all(pool)
    .await?;
    for row in rows {
        let project_id = project_id(&row)?;
        let report = QualityReport {
            id: report_id(&row)?,
            status: status(&row)?,
            overall_score: row.try_get("overall_score")?,
            richness_score: row.try_get("richness_score")?,
            created_at: created_at(&row)?,
        };
        keep_latest(&mut by_project.entry(project_id).or_default().quality, report);
    }

    for (table, is_coherence) in [("coherence_reports", true), ("innovation_reports", false)] {
        let rows = sqlx::query(&format!(
            r#"
            SELECT r.id, r.project_id, r.status, r.score, r.created_at
            FROM {} r
            JOIN projects p ON p.id = r.project_id
            WHERE p.hackathon_id = ?
            "#,
            table
        ))
        .bind(hackathon_key)
        .fetch_all(pool)
        .await?;

        for row in rows {
            let project_id = project_id(&row)?;
            let report = ScoreReport {
                id: report_id(&row)?,
                status: status(&row)?,
                score: row.try_get("score")?,
                created_at: created_at(&row)?,
            };
            let entry = by_project.entry(project_id).or_default();
            if is_coherence {
                keep_latest(&mut entry.coherence, report);
            } else {
                keep_latest(&mut entry.innovation, report);
            }
        }
    }

    Ok(by_project)
}

fn project_id(row: &sqlx::sqlite::SqliteRow) -> Result<Uuid> {
    let id: String = row.try_get("project_id")?;
    parse_uuid("project_id", &id)
}

fn report_id(row: &sqlx::sqlite::SqliteRow) -> Result<Uuid> {
    let id: String = row.try_get("id")?;
    parse_uuid("report id", &id)
}

fn status(row: &sqlx::sqlite::SqliteRow) -> Result<crate::models::ReportStatus> {
    let status: String = row.try_get("status")?;
    status.parse()
}

fn created_at(row: &sqlx::sqlite::SqliteRow) -> Result<chrono::DateTime<chrono::Utc>> {
    let created_at: String = row.try_get("created_at")?;
    parse_timestamp("created_at", &created_at)
}
