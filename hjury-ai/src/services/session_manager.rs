//! Session lifecycle: create, read, progress, results, reset
//!
//! Every operation is scoped to the owner of the hackathon. Sessions that
//! exist but belong to someone else are reported as not found.

use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use uuid::Uuid;

use hjury_common::events::{EventBus, JuryEvent};
use hjury_common::{Error, Result};

use crate::db::{candidates, layer_results, sessions};
use crate::models::{
    EligibilityCriteria, EvaluationSession, FinalResults, LayerResult, SessionStatus, TOTAL_LAYERS,
};
use crate::services::progress_tracker::{ProgressTracker, SessionProgress};

/// Session with its results grouped per layer
#[derive(Debug, Clone, Serialize)]
pub struct SessionWithResults {
    #[serde(flatten)]
    pub session: EvaluationSession,
    pub layers: BTreeMap<u8, Vec<LayerResult>>,
}

/// Persisted progress of one layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerProgressSummary {
    pub layer: u8,
    /// Candidates entering the layer
    pub total: usize,
    pub processed: usize,
    pub eliminated: usize,
    pub advanced: usize,
    pub completed: bool,
}

/// Progress derived from persisted layer results
#[derive(Debug, Clone, Serialize)]
pub struct SessionProgressSummary {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub current_layer: u8,
    pub total_layers: u8,
    pub total_candidates: usize,
    pub eliminated_count: usize,
    pub layers: Vec<LayerProgressSummary>,
}

#[derive(Clone)]
pub struct SessionManager {
    db: SqlitePool,
    tracker: ProgressTracker,
    event_bus: EventBus,
}

impl SessionManager {
    pub fn new(db: SqlitePool, tracker: ProgressTracker, event_bus: EventBus) -> Self {
        Self {
            db,
            tracker,
            event_bus,
        }
    }

    /// Latest session of a hackathon, if any
    pub async fn get_session_by_hackathon(
        &self,
        hackathon_id: Uuid,
        owner_id: &str,
    ) -> Result<Option<SessionWithResults>> {
        self.check_hackathon_owner(hackathon_id, owner_id).await?;

        match sessions::latest_for_hackathon(&self.db, hackathon_id).await? {
            Some(session) => Ok(Some(self.with_results(session).await?)),
            None => Ok(None),
        }
    }

    /// Open a new PENDING session over the hackathon's current projects
    pub async fn create_session(
        &self,
        hackathon_id: Uuid,
        owner_id: &str,
        eligibility_criteria: serde_json::Value,
    ) -> Result<EvaluationSession> {
        EligibilityCriteria::from_value(&eligibility_criteria)?;
        self.check_hackathon_owner(hackathon_id, owner_id).await?;

        if sessions::has_active_session(&self.db, hackathon_id).await? {
            return Err(Error::Conflict(format!(
                "An active jury session already exists for hackathon {}",
                hackathon_id
            )));
        }

        let total_candidates = candidates::count_candidates(&self.db, hackathon_id).await?;
        let session = EvaluationSession::new(
            hackathon_id,
            owner_id.to_string(),
            eligibility_criteria,
            total_candidates,
        );
        sessions::insert_session(&self.db, &session).await?;

        tracing::info!(
            session_id = %session.id,
            hackathon_id = %hackathon_id,
            total_candidates,
            "Jury session created"
        );
        self.event_bus.emit_lossy(JuryEvent::SessionCreated {
            session_id: session.id,
            hackathon_id,
            total_candidates,
            timestamp: Utc::now(),
        });

        Ok(session)
    }

    pub async fn get_session(&self, session_id: Uuid, owner_id: &str) -> Result<SessionWithResults> {
        let session = sessions::load_owned_session(&self.db, session_id, owner_id).await?;
        self.with_results(session).await
    }

    /// Per-layer counts from persisted rows, independent of the tracker
    pub async fn get_progress(
        &self,
        session_id: Uuid,
        owner_id: &str,
    ) -> Result<SessionProgressSummary> {
        let session = sessions::load_owned_session(&self.db, session_id, owner_id).await?;
        let counts = layer_results::layer_counts(&self.db, session_id).await?;

        // Layer 1 rows are the candidate set that was actually evaluated
        let mut entering = counts
            .iter()
            .find(|c| c.layer == 1)
            .map_or(session.total_candidates, |c| c.total);
        let mut layers = Vec::with_capacity(usize::from(TOTAL_LAYERS));
        for layer in 1..=TOTAL_LAYERS {
            let count = counts.iter().find(|c| c.layer == layer);
            let processed = count.map_or(0, |c| c.total);
            let eliminated = count.map_or(0, |c| c.eliminated);

            layers.push(LayerProgressSummary {
                layer,
                total: entering,
                processed,
                eliminated,
                advanced: processed - eliminated,
                completed: layer < session.current_layer,
            });
            entering = entering.saturating_sub(eliminated);
        }

        Ok(SessionProgressSummary {
            session_id,
            status: session.status,
            current_layer: session.current_layer,
            total_layers: session.total_layers,
            total_candidates: session.total_candidates,
            eliminated_count: session.eliminated_count,
            layers,
        })
    }

    /// Live tracker snapshot
    pub async fn get_live_progress(
        &self,
        session_id: Uuid,
        owner_id: &str,
    ) -> Result<SessionProgress> {
        sessions::load_owned_session(&self.db, session_id, owner_id).await?;
        self.tracker
            .get_session_progress(session_id)
            .ok_or_else(|| {
                Error::NotFound(format!("No live progress for session {}", session_id))
            })
    }

    /// Final rankings; only available once the session is COMPLETED
    pub async fn get_results(&self, session_id: Uuid, owner_id: &str) -> Result<FinalResults> {
        let session = sessions::load_owned_session(&self.db, session_id, owner_id).await?;
        if session.status != SessionStatus::Completed {
            return Err(Error::Conflict(format!(
                "Session {} is not completed (status {})",
                session_id, session.status
            )));
        }
        session.final_results.ok_or_else(|| {
            Error::Internal(format!("Completed session {} has no final results", session_id))
        })
    }

    /// Discard every layer result and start over from layer 1
    pub async fn reset_session(&self, session_id: Uuid, owner_id: &str) -> Result<EvaluationSession> {
        let session = sessions::load_owned_session(&self.db, session_id, owner_id).await?;
        let total_candidates = candidates::count_candidates(&self.db, session.hackathon_id).await?;

        sessions::reset_session(&self.db, session_id, total_candidates).await?;
        self.tracker.clear_session(session_id);

        tracing::info!(session_id = %session_id, total_candidates, "Jury session reset");
        self.event_bus.emit_lossy(JuryEvent::SessionReset {
            session_id,
            timestamp: Utc::now(),
        });

        sessions::load_owned_session(&self.db, session_id, owner_id).await
    }

    async fn check_hackathon_owner(&self, hackathon_id: Uuid, owner_id: &str) -> Result<()> {
        match candidates::hackathon_owner(&self.db, hackathon_id).await? {
            Some(owner) if owner == owner_id => Ok(()),
            _ => Err(Error::NotFound(format!("Hackathon not found: {}", hackathon_id))),
        }
    }

    async fn with_results(&self, session: EvaluationSession) -> Result<SessionWithResults> {
        let results = layer_results::load_for_session(&self.db, session.id).await?;
        let mut layers: BTreeMap<u8, Vec<LayerResult>> = BTreeMap::new();
        for result in results {
            layers.entry(result.layer).or_default().push(result);
        }
        Ok(SessionWithResults { session, layers })
    }
}
