//! Evaluation session state machine
//!
//! PENDING → LAYER_1_ELIGIBILITY → LAYER_2_TECHNOLOGY → LAYER_3_QUALITY →
//! LAYER_4_FINAL → COMPLETED, with FAILED reachable from any state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use hjury_common::Error;

use crate::models::FinalResults;

/// Number of layers in the pipeline
pub const TOTAL_LAYERS: u8 = 4;

/// One stage of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum JuryLayer {
    Eligibility = 1,
    Technology = 2,
    Quality = 3,
    Final = 4,
}

impl JuryLayer {
    pub const ALL: [JuryLayer; 4] = [
        JuryLayer::Eligibility,
        JuryLayer::Technology,
        JuryLayer::Quality,
        JuryLayer::Final,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    /// Session status recorded once this layer has run
    pub fn status(self) -> SessionStatus {
        match self {
            JuryLayer::Eligibility => SessionStatus::Layer1Eligibility,
            JuryLayer::Technology => SessionStatus::Layer2Technology,
            JuryLayer::Quality => SessionStatus::Layer3Quality,
            JuryLayer::Final => SessionStatus::Layer4Final,
        }
    }

    pub fn is_final(self) -> bool {
        self == JuryLayer::Final
    }

    pub fn name(self) -> &'static str {
        match self {
            JuryLayer::Eligibility => "eligibility",
            JuryLayer::Technology => "technology",
            JuryLayer::Quality => "quality",
            JuryLayer::Final => "final",
        }
    }
}

impl TryFrom<u8> for JuryLayer {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(JuryLayer::Eligibility),
            2 => Ok(JuryLayer::Technology),
            3 => Ok(JuryLayer::Quality),
            4 => Ok(JuryLayer::Final),
            other => Err(Error::InvalidInput(format!(
                "Layer number must be between 1 and {}, got {}",
                TOTAL_LAYERS, other
            ))),
        }
    }
}

impl From<JuryLayer> for u8 {
    fn from(layer: JuryLayer) -> Self {
        layer.number()
    }
}

impl fmt::Display for JuryLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.number(), self.name())
    }
}

/// Session workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "LAYER_1_ELIGIBILITY")]
    Layer1Eligibility,
    #[serde(rename = "LAYER_2_TECHNOLOGY")]
    Layer2Technology,
    #[serde(rename = "LAYER_3_QUALITY")]
    Layer3Quality,
    #[serde(rename = "LAYER_4_FINAL")]
    Layer4Final,
    #[serde(rename = "COMPLETED")]
    Completed,
    #[serde(rename = "FAILED")]
    Failed,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Pending => "PENDING",
            SessionStatus::Layer1Eligibility => "LAYER_1_ELIGIBILITY",
            SessionStatus::Layer2Technology => "LAYER_2_TECHNOLOGY",
            SessionStatus::Layer3Quality => "LAYER_3_QUALITY",
            SessionStatus::Layer4Final => "LAYER_4_FINAL",
            SessionStatus::Completed => "COMPLETED",
            SessionStatus::Failed => "FAILED",
        }
    }

    /// Terminal sessions only change through an explicit reset
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Failed)
    }
}

impl FromStr for SessionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(SessionStatus::Pending),
            "LAYER_1_ELIGIBILITY" => Ok(SessionStatus::Layer1Eligibility),
            "LAYER_2_TECHNOLOGY" => Ok(SessionStatus::Layer2Technology),
            "LAYER_3_QUALITY" => Ok(SessionStatus::Layer3Quality),
            "LAYER_4_FINAL" => Ok(SessionStatus::Layer4Final),
            "COMPLETED" => Ok(SessionStatus::Completed),
            "FAILED" => Ok(SessionStatus::Failed),
            other => Err(Error::Internal(format!("Unknown session status: {}", other))),
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One run of the pipeline over a hackathon's projects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationSession {
    pub id: Uuid,

    /// Hackathon whose projects are evaluated
    pub hackathon_id: Uuid,

    /// Principal owning the hackathon
    pub owner_id: String,

    pub status: SessionStatus,

    /// Next layer to run (1-4); 5 once the final layer has run
    pub current_layer: u8,

    pub total_layers: u8,

    pub total_candidates: usize,

    /// Number of eliminated rows across all persisted layer results
    pub eliminated_count: usize,

    /// Layer 1 configuration, stored as submitted
    pub eligibility_criteria: serde_json::Value,

    /// Cached aggregate, present once COMPLETED
    pub final_results: Option<FinalResults>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl EvaluationSession {
    pub fn new(
        hackathon_id: Uuid,
        owner_id: String,
        eligibility_criteria: serde_json::Value,
        total_candidates: usize,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            hackathon_id,
            owner_id,
            status: SessionStatus::Pending,
            current_layer: 1,
            total_layers: TOTAL_LAYERS,
            total_candidates,
            eliminated_count: 0,
            eligibility_criteria,
            final_results: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Reject running `layer` given the session's recorded position
    ///
    /// Earlier layers (and the current one) may be re-run, which discards the
    /// results of every later layer; skipping ahead is refused because the
    /// surviving set of a layer depends on all previous eliminations.
    pub fn check_can_run(&self, layer: JuryLayer) -> Result<(), Error> {
        if self.is_terminal() {
            return Err(Error::Conflict(format!(
                "Session {} is already {}",
                self.id, self.status
            )));
        }
        if layer.number() > self.current_layer {
            return Err(Error::Conflict(format!(
                "Layer {} cannot run before layer {} has completed",
                layer.number(),
                self.current_layer
            )));
        }
        Ok(())
    }
}
