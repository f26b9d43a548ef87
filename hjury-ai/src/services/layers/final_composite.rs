//! Layer 4: weighted coherence/innovation composite (never eliminates)

use serde_json::json;

use crate::models::candidate::status_of;
use crate::models::{clamp_score, AnalysisReport, Candidate, LayerOutcome, ScoreReport};

pub const COHERENCE_WEIGHT: f64 = 0.4;
pub const INNOVATION_WEIGHT: f64 = 0.6;

/// Neutral score used for a missing or unfinished input
pub const NEUTRAL_SCORE: f64 = 65.0;

/// Completed score or the neutral default, plus whether it was defaulted
fn input_score(report: Option<&ScoreReport>) -> (f64, bool) {
    match report.filter(|r| r.is_completed()).and_then(|r| r.score) {
        Some(score) => (score.clamp(0.0, 100.0), false),
        None => (NEUTRAL_SCORE, true),
    }
}

pub fn evaluate(candidate: &Candidate) -> LayerOutcome {
    let coherence_report = candidate.reports.coherence.as_ref();
    let innovation_report = candidate.reports.innovation.as_ref();

    let (coherence, coherence_defaulted) = input_score(coherence_report);
    let (innovation, innovation_defaulted) = input_score(innovation_report);

    let composite = coherence * COHERENCE_WEIGHT + innovation * INNOVATION_WEIGHT;
    let score = clamp_score(composite);

    LayerOutcome::advance(
        score,
        format!(
            "Composite of coherence {} and innovation {}",
            coherence, innovation
        ),
        json!({
            "coherenceScore": coherence,
            "coherenceStatus": status_of(coherence_report),
            "coherenceDefaulted": coherence_defaulted,
            "innovationScore": innovation,
            "innovationStatus": status_of(innovation_report),
            "innovationDefaulted": innovation_defaulted,
            "weights": {
                "coherence": COHERENCE_WEIGHT,
                "innovation": INNOVATION_WEIGHT,
            },
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CandidateReports, ReportStatus};
    use chrono::Utc;
    use uuid::Uuid;

    fn report(status: ReportStatus, score: f64) -> Option<ScoreReport> {
        Some(ScoreReport {
            id: Uuid::new_v4(),
            status,
            score: Some(score),
            created_at: Utc::now(),
        })
    }

    fn candidate(coherence: Option<ScoreReport>, innovation: Option<ScoreReport>) -> Candidate {
        Candidate {
            id: Uuid::new_v4(),
            hackathon_id: Uuid::new_v4(),
            name: "Widget".to_string(),
            github_url: None,
            submitted_at: None,
            category_id: None,
            category_name: None,
            reports: CandidateReports {
                coherence,
                innovation,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_missing_innovation_uses_neutral_default() {
        let outcome = evaluate(&candidate(report(ReportStatus::Completed, 80.0), None));
        assert!(!outcome.eliminated);
        assert_eq!(outcome.score, Some(71));
        assert_eq!(outcome.evidence["coherenceDefaulted"], false);
        assert_eq!(outcome.evidence["innovationDefaulted"], true);
    }

    #[test]
    fn test_pending_inputs_are_defaulted() {
        let outcome = evaluate(&candidate(
            report(ReportStatus::Pending, 10.0),
            report(ReportStatus::InProgress, 10.0),
        ));
        assert_eq!(outcome.score, Some(65));
        assert_eq!(outcome.evidence["coherenceStatus"], "PENDING");
    }

    #[test]
    fn test_weighted_composite() {
        let outcome = evaluate(&candidate(
            report(ReportStatus::Completed, 50.0),
            report(ReportStatus::Completed, 100.0),
        ));
        assert_eq!(outcome.score, Some(80));
    }
}
