//! Per-candidate layer outcomes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

/// Clamp a raw score into 0-100 and round it
pub fn clamp_score(raw: f64) -> u8 {
    if raw.is_nan() {
        return 0;
    }
    raw.clamp(0.0, 100.0).round() as u8
}

/// Decision produced by a layer strategy for one candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerOutcome {
    pub eliminated: bool,
    pub score: Option<u8>,
    pub reason: String,
    /// Inputs that produced the decision, including which were defaulted
    pub evidence: serde_json::Value,
}

impl LayerOutcome {
    pub fn advance(score: u8, reason: impl Into<String>, evidence: serde_json::Value) -> Self {
        Self {
            eliminated: false,
            score: Some(score),
            reason: reason.into(),
            evidence,
        }
    }

    pub fn eliminate(score: u8, reason: impl Into<String>, evidence: serde_json::Value) -> Self {
        Self {
            eliminated: true,
            score: Some(score),
            reason: reason.into(),
            evidence,
        }
    }

    /// Outcome for a candidate whose evaluation itself failed
    pub fn from_error(error: &dyn std::error::Error) -> Self {
        let message = error.to_string();
        Self {
            eliminated: true,
            score: Some(0),
            reason: message.clone(),
            evidence: json!({ "error": message }),
        }
    }
}

/// Persisted outcome of one candidate at one layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerResult {
    pub session_id: Uuid,
    pub layer: u8,
    pub candidate_id: Uuid,
    pub candidate_name: String,
    pub eliminated: bool,
    pub score: Option<u8>,
    pub reason: String,
    pub evidence: serde_json::Value,
    pub processed_at: DateTime<Utc>,
}

impl LayerResult {
    pub fn new(
        session_id: Uuid,
        layer: u8,
        candidate_id: Uuid,
        candidate_name: String,
        outcome: LayerOutcome,
    ) -> Self {
        Self {
            session_id,
            layer,
            candidate_id,
            candidate_name,
            eliminated: outcome.eliminated,
            score: outcome.score,
            reason: outcome.reason,
            evidence: outcome.evidence,
            processed_at: Utc::now(),
        }
    }
}
