//! Per-layer scoring and elimination strategies
//!
//! Layers 2-4 are pure functions of the candidate's latest reports. Layer 1
//! may call out to the repository inspector.

pub mod eligibility;
pub mod final_composite;
pub mod quality;
pub mod technology;

use crate::models::{Candidate, EligibilityCriteria, JuryLayer, LayerOutcome};
use crate::services::github_client::RepositoryInspector;

/// Inputs shared by every candidate evaluation of one layer run
pub struct LayerContext<'a> {
    pub criteria: &'a EligibilityCriteria,
    pub inspector: &'a dyn RepositoryInspector,
}

/// Evaluate one candidate at `layer`
///
/// Never fails: an error while evaluating becomes an eliminating outcome
/// carrying the error message.
pub async fn evaluate(layer: JuryLayer, candidate: &Candidate, ctx: &LayerContext<'_>) -> LayerOutcome {
    match layer {
        JuryLayer::Eligibility => {
            match eligibility::evaluate(candidate, ctx.criteria, ctx.inspector).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::warn!(
                        candidate_id = %candidate.id,
                        error = %e,
                        "Eligibility check failed; eliminating candidate"
                    );
                    LayerOutcome::from_error(&e)
                }
            }
        }
        JuryLayer::Technology => technology::evaluate(candidate),
        JuryLayer::Quality => quality::evaluate(candidate),
        JuryLayer::Final => final_composite::evaluate(candidate),
    }
}
