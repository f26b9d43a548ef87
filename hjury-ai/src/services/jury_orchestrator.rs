//! Layer execution
//!
//! Runs one layer of a session over the candidates still in the tournament:
//!
//! 1. Load session, candidates (latest reports) and prior layer results
//! 2. Drop candidates eliminated by an earlier layer
//! 3. Evaluate in sequential batches, concurrently inside each batch
//! 4. Replace the layer's results and advance the session in one transaction
//! 5. After the final layer, rank per category and complete the session
//!
//! Per-candidate failures are recorded as eliminations. Load and persistence
//! failures abort the run and leave the session row untouched.

use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use hjury_common::config::JuryTuning;
use hjury_common::events::{EventBus, JuryEvent};
use hjury_common::{Error, Result};

use crate::db::{candidates, layer_results, sessions, settings};
use crate::models::{
    Candidate, EligibilityCriteria, EvaluationSession, FinalResults, JuryLayer, LayerResult,
};
use crate::services::github_client::RepositoryInspector;
use crate::services::layers::{self, LayerContext};
use crate::services::progress_tracker::ProgressTracker;
use crate::services::results_aggregator::{self, RankingEntry};
use crate::utils::retry_on_lock;

/// Outcome of one `execute_layer` call
#[derive(Debug, Clone, Serialize)]
pub struct LayerExecutionSummary {
    pub session_id: Uuid,
    pub layer: u8,
    pub processed: usize,
    pub eliminated: usize,
    pub advanced: usize,
    pub results: Vec<LayerResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_results: Option<FinalResults>,
}

/// Drives layer runs for all sessions
#[derive(Clone)]
pub struct JuryOrchestrator {
    db: SqlitePool,
    tracker: ProgressTracker,
    event_bus: EventBus,
    inspector: Arc<dyn RepositoryInspector>,
    tuning: JuryTuning,
}

impl JuryOrchestrator {
    pub fn new(
        db: SqlitePool,
        tracker: ProgressTracker,
        event_bus: EventBus,
        inspector: Arc<dyn RepositoryInspector>,
        tuning: JuryTuning,
    ) -> Self {
        Self {
            db,
            tracker,
            event_bus,
            inspector,
            tuning,
        }
    }

    /// Run `layer_number` for a session owned by `owner_id`
    pub async fn execute_layer(
        &self,
        session_id: Uuid,
        layer_number: u8,
        owner_id: &str,
    ) -> Result<LayerExecutionSummary> {
        let layer = JuryLayer::try_from(layer_number)?;

        let session = sessions::load_owned_session(&self.db, session_id, owner_id).await?;
        session.check_can_run(layer)?;

        let criteria = if layer == JuryLayer::Eligibility {
            match EligibilityCriteria::from_value(&session.eligibility_criteria) {
                Ok(criteria) => criteria,
                Err(e) => {
                    tracing::error!(session_id = %session_id, error = %e, "Session criteria unreadable");
                    sessions::mark_failed(&self.db, session_id).await?;
                    self.emit_failed(session_id, layer, &e);
                    return Err(e);
                }
            }
        } else {
            EligibilityCriteria::default()
        };

        let all_candidates = candidates::load_candidates(&self.db, session.hackathon_id).await?;
        let prior_results = layer_results::load_for_session(&self.db, session_id).await?;
        let surviving = surviving_candidates(all_candidates, &prior_results, layer);

        tracing::info!(
            session_id = %session_id,
            layer = layer.number(),
            name = layer.name(),
            candidates = surviving.len(),
            "Starting jury layer"
        );

        if layer == JuryLayer::Eligibility {
            self.tracker.initialize_session(session_id, surviving.len());
        } else if !self.tracker.contains(session_id) {
            self.tracker
                .initialize_session(session_id, session.total_candidates);
        }
        self.tracker
            .start_layer(session_id, layer.number(), surviving.len());
        self.event_bus.emit_lossy(JuryEvent::LayerStarted {
            session_id,
            layer: layer.number(),
            total_candidates: surviving.len(),
            timestamp: Utc::now(),
        });

        let ctx = LayerContext {
            criteria: &criteria,
            inspector: self.inspector.as_ref(),
        };
        let results = self.evaluate_batches(session_id, layer, &surviving, &ctx).await;

        let eliminated = results.iter().filter(|r| r.eliminated).count();
        let advanced = results.len() - eliminated;

        let final_results = layer
            .is_final()
            .then(|| rank_finalists(&surviving, &results, self.tuning.top_k));

        if let Err(e) = self
            .persist(&session, layer, &results, final_results.as_ref())
            .await
        {
            tracing::error!(
                session_id = %session_id,
                layer = layer.number(),
                error = %e,
                "Failed to persist layer results"
            );
            self.tracker.fail_layer(session_id, layer.number());
            self.emit_failed(session_id, layer, &e);
            return Err(e);
        }

        self.tracker
            .complete_layer(session_id, layer.number(), eliminated, advanced);
        self.event_bus.emit_lossy(JuryEvent::LayerCompleted {
            session_id,
            layer: layer.number(),
            processed: results.len(),
            eliminated,
            advanced,
            timestamp: Utc::now(),
        });

        tracing::info!(
            session_id = %session_id,
            layer = layer.number(),
            processed = results.len(),
            eliminated,
            advanced,
            "Jury layer completed"
        );

        if let Some(final_results) = &final_results {
            self.tracker
                .complete_session(session_id, final_results.clone());
            self.event_bus.emit_lossy(JuryEvent::SessionCompleted {
                session_id,
                total_winners: final_results.total_winners,
                timestamp: Utc::now(),
            });
            tracing::info!(
                session_id = %session_id,
                categories = final_results.total_categories,
                winners = final_results.total_winners,
                "Jury session completed"
            );
        }

        Ok(LayerExecutionSummary {
            session_id,
            layer: layer.number(),
            processed: results.len(),
            eliminated,
            advanced,
            results,
            final_results,
        })
    }

    /// Evaluate candidates batch by batch; peak concurrency is the batch size
    async fn evaluate_batches(
        &self,
        session_id: Uuid,
        layer: JuryLayer,
        candidates: &[Candidate],
        ctx: &LayerContext<'_>,
    ) -> Vec<LayerResult> {
        let batch_size = self.tuning.batch_size.max(1);
        let batch_delay = Duration::from_millis(self.tuning.batch_delay_ms);
        let mut results = Vec::with_capacity(candidates.len());

        for (index, batch) in candidates.chunks(batch_size).enumerate() {
            if index > 0 && !batch_delay.is_zero() {
                tokio::time::sleep(batch_delay).await;
            }

            tracing::debug!(
                session_id = %session_id,
                layer = layer.number(),
                batch = index + 1,
                size = batch.len(),
                "Evaluating batch"
            );

            let evaluations = batch
                .iter()
                .map(|candidate| self.evaluate_candidate(session_id, layer, candidate, ctx));
            results.extend(join_all(evaluations).await);
        }

        results
    }

    async fn evaluate_candidate(
        &self,
        session_id: Uuid,
        layer: JuryLayer,
        candidate: &Candidate,
        ctx: &LayerContext<'_>,
    ) -> LayerResult {
        self.tracker.start_processing_candidate(
            session_id,
            layer.number(),
            candidate.id,
            &candidate.name,
        );

        let outcome = layers::evaluate(layer, candidate, ctx).await;

        self.tracker.complete_candidate(
            session_id,
            layer.number(),
            candidate.id,
            &candidate.name,
            outcome.eliminated,
        );

        LayerResult::new(
            session_id,
            layer.number(),
            candidate.id,
            candidate.name.clone(),
            outcome,
        )
    }

    /// Commit the layer, retrying lock contention inside an overall timeout
    async fn persist(
        &self,
        session: &EvaluationSession,
        layer: JuryLayer,
        results: &[LayerResult],
        final_results: Option<&FinalResults>,
    ) -> Result<usize> {
        let max_wait_ms = settings::max_lock_wait_ms(&self.db).await?;
        let timeout = Duration::from_millis(self.tuning.transaction_timeout_ms);

        let pool = &self.db;
        let session_id = session.id;
        let chunk_size = self.tuning.insert_chunk_size;

        let commit = retry_on_lock("commit_layer", max_wait_ms, move || {
            layer_results::commit_layer(pool, session_id, layer, results, chunk_size, final_results)
        });

        match tokio::time::timeout(timeout, commit).await {
            Ok(result) => result,
            Err(_) => Err(Error::Internal(format!(
                "Layer {} transaction timed out after {}ms",
                layer.number(),
                timeout.as_millis()
            ))),
        }
    }

    fn emit_failed(&self, session_id: Uuid, layer: JuryLayer, error: &Error) {
        self.event_bus.emit_lossy(JuryEvent::LayerFailed {
            session_id,
            layer: layer.number(),
            error: error.to_string(),
            timestamp: Utc::now(),
        });
    }
}

/// Candidates not eliminated by any layer before `layer`
fn surviving_candidates(
    candidates: Vec<Candidate>,
    prior_results: &[LayerResult],
    layer: JuryLayer,
) -> Vec<Candidate> {
    let eliminated: HashSet<Uuid> = prior_results
        .iter()
        .filter(|r| r.layer < layer.number() && r.eliminated)
        .map(|r| r.candidate_id)
        .collect();

    candidates
        .into_iter()
        .filter(|c| !eliminated.contains(&c.id))
        .collect()
}

/// Rank the final layer's survivors per category
fn rank_finalists(candidates: &[Candidate], results: &[LayerResult], top_k: usize) -> FinalResults {
    let by_id: HashMap<Uuid, &Candidate> = candidates.iter().map(|c| (c.id, c)).collect();

    let entries = results
        .iter()
        .filter(|r| !r.eliminated)
        .map(|r| {
            let candidate = by_id.get(&r.candidate_id);
            RankingEntry {
                candidate_id: r.candidate_id,
                candidate_name: r.candidate_name.clone(),
                category_id: candidate.and_then(|c| c.category_id),
                category_name: candidate.and_then(|c| c.category_name.clone()),
                score: r.score,
            }
        })
        .collect();

    results_aggregator::aggregate(entries, top_k)
}
