//! Evaluation session persistence

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use hjury_common::{Error, Result};

use super::{parse_optional_timestamp, parse_timestamp, parse_uuid, to_db_timestamp};
use crate::models::{EvaluationSession, FinalResults, SessionStatus};
use crate::utils::begin_monitored;

const SESSION_COLUMNS: &str = r#"
    id, hackathon_id, owner_id, status, current_layer, total_layers,
    total_candidates, eliminated_count, eligibility_criteria, final_results,
    created_at, updated_at, completed_at
"#;

/// Insert a new session
///
/// A second non-terminal session for the same hackathon violates the
/// `idx_jury_sessions_active` index and is reported as a conflict.
pub async fn insert_session(pool: &SqlitePool, session: &EvaluationSession) -> Result<()> {
    let criteria = serde_json::to_string(&session.eligibility_criteria)
        .map_err(|e| Error::Internal(format!("Failed to serialize criteria: {}", e)))?;

    let result = sqlx::query(
        r#"
        INSERT INTO jury_sessions (
            id, hackathon_id, owner_id, status, current_layer, total_layers,
            total_candidates, eliminated_count, eligibility_criteria,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(session.id.to_string())
    .bind(session.hackathon_id.to_string())
    .bind(&session.owner_id)
    .bind(session.status.as_str())
    .bind(i64::from(session.current_layer))
    .bind(i64::from(session.total_layers))
    .bind(session.total_candidates as i64)
    .bind(session.eliminated_count as i64)
    .bind(criteria)
    .bind(to_db_timestamp(session.created_at))
    .bind(to_db_timestamp(session.updated_at))
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            Err(Error::Conflict(format!(
                "An active jury session already exists for hackathon {}",
                session.hackathon_id
            )))
        }
        Err(e) => Err(Error::Database(e)),
    }
}

/// Load a session owned by `owner_id`
///
/// Sessions owned by someone else are reported as not found.
pub async fn load_owned_session(
    pool: &SqlitePool,
    session_id: Uuid,
    owner_id: &str,
) -> Result<EvaluationSession> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM jury_sessions WHERE id = ? AND owner_id = ?",
        SESSION_COLUMNS
    ))
    .bind(session_id.to_string())
    .bind(owner_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => row_to_session(&row),
        None => Err(Error::NotFound(format!("Jury session not found: {}", session_id))),
    }
}

/// Most recently created session for a hackathon
pub async fn latest_for_hackathon(
    pool: &SqlitePool,
    hackathon_id: Uuid,
) -> Result<Option<EvaluationSession>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM jury_sessions WHERE hackathon_id = ? ORDER BY created_at DESC LIMIT 1",
        SESSION_COLUMNS
    ))
    .bind(hackathon_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(row_to_session).transpose()
}

/// Whether a non-terminal session exists for the hackathon
pub async fn has_active_session(pool: &SqlitePool, hackathon_id: Uuid) -> Result<bool> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM jury_sessions
        WHERE hackathon_id = ? AND status NOT IN ('COMPLETED', 'FAILED')
        "#,
    )
    .bind(hackathon_id.to_string())
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}

/// Mark a session FAILED
pub async fn mark_failed(pool: &SqlitePool, session_id: Uuid) -> Result<()> {
    let now = to_db_timestamp(Utc::now());
    sqlx::query(
        "UPDATE jury_sessions SET status = ?, updated_at = ?, completed_at = ? WHERE id = ?",
    )
    .bind(SessionStatus::Failed.as_str())
    .bind(&now)
    .bind(&now)
    .bind(session_id.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Wipe all layer results and return the session to PENDING at layer 1
pub async fn reset_session(
    pool: &SqlitePool,
    session_id: Uuid,
    total_candidates: usize,
) -> Result<()> {
    let mut tx = begin_monitored(pool, "sessions::reset_session").await?;

    sqlx::query("DELETE FROM jury_layer_results WHERE session_id = ?")
        .bind(session_id.to_string())
        .execute(tx.conn())
        .await?;

    sqlx::query(
        r#"
        UPDATE jury_sessions
        SET status = ?, current_layer = 1, eliminated_count = 0,
            total_candidates = ?, final_results = NULL, completed_at = NULL,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(SessionStatus::Pending.as_str())
    .bind(total_candidates as i64)
    .bind(to_db_timestamp(Utc::now()))
    .bind(session_id.to_string())
    .execute(tx.conn())
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => Error::Conflict(format!(
            "Another active jury session exists for the hackathon of session {}",
            session_id
        )),
        e => Error::Database(e),
    })?;

    tx.commit().await
}

fn row_to_session(row: &SqliteRow) -> Result<EvaluationSession> {
    let id: String = row.try_get("id")?;
    let hackathon_id: String = row.try_get("hackathon_id")?;
    let status: String = row.try_get("status")?;

    let criteria: String = row.try_get("eligibility_criteria")?;
    let eligibility_criteria: serde_json::Value = serde_json::from_str(&criteria)
        .map_err(|e| Error::Internal(format!("Failed to deserialize criteria: {}", e)))?;

    let final_results: Option<String> = row.try_get("final_results")?;
    let final_results: Option<FinalResults> = final_results
        .map(|json| serde_json::from_str(&json))
        .transpose()
        .map_err(|e| Error::Internal(format!("Failed to deserialize final results: {}", e)))?;

    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(EvaluationSession {
        id: parse_uuid("id", &id)?,
        hackathon_id: parse_uuid("hackathon_id", &hackathon_id)?,
        owner_id: row.try_get("owner_id")?,
        status: status.parse()?,
        current_layer: u8::try_from(row.try_get::<i64, _>("current_layer")?)
            .map_err(|e| Error::Internal(format!("Invalid current_layer: {}", e)))?,
        total_layers: u8::try_from(row.try_get::<i64, _>("total_layers")?)
            .map_err(|e| Error::Internal(format!("Invalid total_layers: {}", e)))?,
        total_candidates: row.try_get::<i64, _>("total_candidates")?.max(0) as usize,
        eliminated_count: row.try_get::<i64, _>("eliminated_count")?.max(0) as usize,
        eligibility_criteria,
        final_results,
        created_at: parse_timestamp("created_at", &created_at)?,
        updated_at: parse_timestamp("updated_at", &updated_at)?,
        completed_at: parse_optional_timestamp("completed_at", row.try_get("completed_at")?)?,
    })
}
