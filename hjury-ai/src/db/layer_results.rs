//! Layer result persistence
//!
//! The result set of a (session, layer) pair is always replaced as a whole,
//! together with the session counters, inside one transaction.

use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use uuid::Uuid;

use hjury_common::{Error, Result};

use super::{parse_timestamp, parse_uuid, to_db_timestamp};
use crate::models::{FinalResults, JuryLayer, LayerResult, SessionStatus, TOTAL_LAYERS};
use crate::utils::begin_monitored;

/// Persisted row counts for one layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerCounts {
    pub layer: u8,
    pub total: usize,
    pub eliminated: usize,
}

/// All results for a session, ordered by layer then candidate name
pub async fn load_for_session(pool: &SqlitePool, session_id: Uuid) -> Result<Vec<LayerResult>> {
    let rows = sqlx::query(
        r#"
        SELECT r.session_id, r.layer, r.candidate_id, COALESCE(p.name, '') AS candidate_name,
               r.eliminated, r.score, r.reason, r.evidence, r.processed_at
        FROM jury_layer_results r
        LEFT JOIN projects p ON p.id = r.candidate_id
        WHERE r.session_id = ?
        ORDER BY r.layer, candidate_name, r.candidate_id
        "#,
    )
    .bind(session_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let session_id: String = row.try_get("session_id")?;
            let candidate_id: String = row.try_get("candidate_id")?;
            let evidence: String = row.try_get("evidence")?;
            let processed_at: String = row.try_get("processed_at")?;
            let score: Option<i64> = row.try_get("score")?;

            Ok(LayerResult {
                session_id: parse_uuid("session_id", &session_id)?,
                layer: u8::try_from(row.try_get::<i64, _>("layer")?)
                    .map_err(|e| Error::Internal(format!("Invalid layer: {}", e)))?,
                candidate_id: parse_uuid("candidate_id", &candidate_id)?,
                candidate_name: row.try_get("candidate_name")?,
                eliminated: row.try_get::<i64, _>("eliminated")? != 0,
                score: score
                    .map(u8::try_from)
                    .transpose()
                    .map_err(|e| Error::Internal(format!("Invalid score: {}", e)))?,
                reason: row.try_get("reason")?,
                evidence: serde_json::from_str(&evidence)
                    .map_err(|e| Error::Internal(format!("Failed to deserialize evidence: {}", e)))?,
                processed_at: parse_timestamp("processed_at", &processed_at)?,
            })
        })
        .collect()
}

/// Per-layer totals derived from persisted rows
pub async fn layer_counts(pool: &SqlitePool, session_id: Uuid) -> Result<Vec<LayerCounts>> {
    let rows: Vec<(i64, i64, i64)> = sqlx::query_as(
        r#"
        SELECT layer, COUNT(*), COALESCE(SUM(eliminated), 0)
        FROM jury_layer_results
        WHERE session_id = ?
        GROUP BY layer
        ORDER BY layer
        "#,
    )
    .bind(session_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|(layer, total, eliminated)| {
            Ok(LayerCounts {
                layer: u8::try_from(layer)
                    .map_err(|e| Error::Internal(format!("Invalid layer: {}", e)))?,
                total: total.max(0) as usize,
                eliminated: eliminated.max(0) as usize,
            })
        })
        .collect()
}

/// Replace the results of `layer` and advance the session, atomically
///
/// Rows of `layer` and of every later layer are removed first: later layers
/// were computed from a surviving set that no longer holds. `eliminated_count`
/// is then recomputed from every persisted row of the session, so re-running
/// a layer never double counts. Layer 1 also refreshes `total_candidates` to
/// the candidate set it actually evaluated. When `completion` is given the
/// session is also marked COMPLETED with the aggregate cached.
///
/// Returns the session's new `eliminated_count`.
pub async fn commit_layer(
    pool: &SqlitePool,
    session_id: Uuid,
    layer: JuryLayer,
    results: &[LayerResult],
    chunk_size: usize,
    completion: Option<&FinalResults>,
) -> Result<usize> {
    let session_key = session_id.to_string();
    let layer_number = i64::from(layer.number());

    let mut tx = begin_monitored(pool, "layer_results::commit_layer").await?;

    sqlx::query("DELETE FROM jury_layer_results WHERE session_id = ? AND layer >= ?")
        .bind(&session_key)
        .bind(layer_number)
        .execute(tx.conn())
        .await?;

    for chunk in results.chunks(chunk_size.max(1)) {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "INSERT INTO jury_layer_results \
             (session_id, layer, candidate_id, eliminated, score, reason, evidence, processed_at) ",
        );
        builder.push_values(chunk, |mut row, result| {
            row.push_bind(&session_key)
                .push_bind(layer_number)
                .push_bind(result.candidate_id.to_string())
                .push_bind(i64::from(result.eliminated))
                .push_bind(result.score.map(i64::from))
                .push_bind(&result.reason)
                .push_bind(result.evidence.to_string())
                .push_bind(to_db_timestamp(result.processed_at));
        });
        builder.build().execute(tx.conn()).await?;
    }

    let eliminated_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM jury_layer_results WHERE session_id = ? AND eliminated = 1",
    )
    .bind(&session_key)
    .fetch_one(tx.conn())
    .await?;

    if layer == JuryLayer::Eligibility {
        sqlx::query("UPDATE jury_sessions SET total_candidates = ? WHERE id = ?")
            .bind(results.len() as i64)
            .bind(&session_key)
            .execute(tx.conn())
            .await?;
    }

    let now = to_db_timestamp(Utc::now());
    let next_layer = (layer.number() + 1).min(TOTAL_LAYERS + 1);

    match completion {
        Some(final_results) => {
            let final_json = serde_json::to_string(final_results)
                .map_err(|e| Error::Internal(format!("Failed to serialize final results: {}", e)))?;
            sqlx::query(
                r#"
                UPDATE jury_sessions
                SET eliminated_count = ?, current_layer = ?, status = ?,
                    final_results = ?, completed_at = ?, updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(eliminated_count)
            .bind(i64::from(next_layer))
            .bind(SessionStatus::Completed.as_str())
            .bind(final_json)
            .bind(&now)
            .bind(&now)
            .bind(&session_key)
            .execute(tx.conn())
            .await?;
        }
        None => {
            sqlx::query(
                r#"
                UPDATE jury_sessions
                SET eliminated_count = ?, current_layer = ?, status = ?, updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(eliminated_count)
            .bind(i64::from(next_layer))
            .bind(layer.status().as_str())
            .bind(&now)
            .bind(&session_key)
            .execute(tx.conn())
            .await?;
        }
    }

    tx.commit().await?;

    Ok(eliminated_count.max(0) as usize)
}
