//! Live progress of running jury sessions
//!
//! Process-local and advisory: entries are evicted after a period without
//! access and when the cache is full, and vanish on restart. Authoritative
//! progress comes from the persisted layer results.

use chrono::{DateTime, Utc};
use moka::sync::Cache;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use crate::models::FinalResults;

/// Status of a session or layer as seen by the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    Processing,
    Completed,
}

/// Most recently touched candidate of a layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentCandidate {
    pub id: Uuid,
    pub name: String,
    pub status: CandidateStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerProgress {
    pub total_candidates: usize,
    pub processed_count: usize,
    pub eliminated_count: usize,
    pub advanced_count: usize,
    pub current_candidate: Option<CurrentCandidate>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: ProgressStatus,
}

impl LayerProgress {
    fn started(total_candidates: usize) -> Self {
        Self {
            total_candidates,
            processed_count: 0,
            eliminated_count: 0,
            advanced_count: 0,
            current_candidate: None,
            start_time: Utc::now(),
            end_time: None,
            status: ProgressStatus::InProgress,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionProgress {
    pub session_id: Uuid,
    pub total_candidates: usize,
    pub current_layer: u8,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: ProgressStatus,
    pub layers: BTreeMap<u8, LayerProgress>,
    pub final_results: Option<FinalResults>,
}

impl SessionProgress {
    fn new(session_id: Uuid, total_candidates: usize) -> Self {
        Self {
            session_id,
            total_candidates,
            current_layer: 1,
            start_time: Utc::now(),
            end_time: None,
            status: ProgressStatus::Pending,
            layers: BTreeMap::new(),
            final_results: None,
        }
    }
}

type SharedProgress = Arc<Mutex<SessionProgress>>;

/// Bounded, idle-evicting map of session id to live progress
#[derive(Clone)]
pub struct ProgressTracker {
    sessions: Cache<Uuid, SharedProgress>,
}

impl ProgressTracker {
    pub fn new(max_sessions: u64, idle: Duration) -> Self {
        let sessions = Cache::builder()
            .max_capacity(max_sessions)
            .time_to_idle(idle)
            .eviction_listener(|session_id, _progress, cause| {
                tracing::debug!(session_id = %session_id, ?cause, "Progress entry evicted");
            })
            .build();
        Self { sessions }
    }

    /// Start tracking a session from scratch, replacing any previous entry
    pub fn initialize_session(&self, session_id: Uuid, total_candidates: usize) {
        self.sessions.insert(
            session_id,
            Arc::new(Mutex::new(SessionProgress::new(session_id, total_candidates))),
        );
    }

    /// Whether the session has a live entry
    pub fn contains(&self, session_id: Uuid) -> bool {
        self.sessions.contains_key(&session_id)
    }

    /// Begin `layer`; progress recorded for later layers is discarded
    pub fn start_layer(&self, session_id: Uuid, layer: u8, total_candidates: usize) {
        self.update(session_id, |progress| {
            progress.current_layer = layer;
            progress.status = ProgressStatus::InProgress;
            progress.end_time = None;
            progress.final_results = None;
            progress.layers.retain(|&number, _| number < layer);
            progress
                .layers
                .insert(layer, LayerProgress::started(total_candidates));
        });
    }

    pub fn start_processing_candidate(
        &self,
        session_id: Uuid,
        layer: u8,
        candidate_id: Uuid,
        candidate_name: &str,
    ) {
        self.update_layer(session_id, layer, |layer_progress| {
            layer_progress.current_candidate = Some(CurrentCandidate {
                id: candidate_id,
                name: candidate_name.to_string(),
                status: CandidateStatus::Processing,
            });
        });
    }

    pub fn complete_candidate(
        &self,
        session_id: Uuid,
        layer: u8,
        candidate_id: Uuid,
        candidate_name: &str,
        eliminated: bool,
    ) {
        self.update_layer(session_id, layer, |layer_progress| {
            layer_progress.processed_count += 1;
            if eliminated {
                layer_progress.eliminated_count += 1;
            } else {
                layer_progress.advanced_count += 1;
            }
            layer_progress.current_candidate = Some(CurrentCandidate {
                id: candidate_id,
                name: candidate_name.to_string(),
                status: CandidateStatus::Completed,
            });
        });
    }

    /// Close a layer with its final counts
    pub fn complete_layer(&self, session_id: Uuid, layer: u8, eliminated: usize, advanced: usize) {
        self.update_layer(session_id, layer, |layer_progress| {
            layer_progress.eliminated_count = eliminated;
            layer_progress.advanced_count = advanced;
            layer_progress.processed_count = eliminated + advanced;
            layer_progress.current_candidate = None;
            layer_progress.end_time = Some(Utc::now());
            layer_progress.status = ProgressStatus::Completed;
        });
    }

    /// Mark a layer (and the session) failed after a persistence error
    pub fn fail_layer(&self, session_id: Uuid, layer: u8) {
        self.update(session_id, |progress| {
            progress.status = ProgressStatus::Failed;
            if let Some(layer_progress) = progress.layers.get_mut(&layer) {
                layer_progress.status = ProgressStatus::Failed;
                layer_progress.current_candidate = None;
                layer_progress.end_time = Some(Utc::now());
            }
        });
    }

    pub fn complete_session(&self, session_id: Uuid, final_results: FinalResults) {
        self.update(session_id, |progress| {
            progress.status = ProgressStatus::Completed;
            progress.end_time = Some(Utc::now());
            progress.final_results = Some(final_results);
        });
    }

    /// Snapshot of a session's progress
    pub fn get_session_progress(&self, session_id: Uuid) -> Option<SessionProgress> {
        let entry = self.sessions.get(&session_id)?;
        let progress = entry.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Some(progress.clone())
    }

    pub fn get_layer_progress(&self, session_id: Uuid, layer: u8) -> Option<LayerProgress> {
        let entry = self.sessions.get(&session_id)?;
        let progress = entry.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        progress.layers.get(&layer).cloned()
    }

    pub fn clear_session(&self, session_id: Uuid) {
        self.sessions.invalidate(&session_id);
    }

    fn update(&self, session_id: Uuid, f: impl FnOnce(&mut SessionProgress)) {
        match self.sessions.get(&session_id) {
            Some(entry) => {
                let mut progress = entry.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                f(&mut progress);
            }
            None => {
                tracing::debug!(session_id = %session_id, "Progress update for untracked session ignored");
            }
        }
    }

    fn update_layer(&self, session_id: Uuid, layer: u8, f: impl FnOnce(&mut LayerProgress)) {
        self.update(session_id, |progress| {
            if let Some(layer_progress) = progress.layers.get_mut(&layer) {
                f(layer_progress);
            }
        });
    }
}
