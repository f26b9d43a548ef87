//! Layer 3: code quality (never eliminates)

use serde_json::json;

use crate::models::candidate::status_of;
use crate::models::{clamp_score, AnalysisReport, Candidate, LayerOutcome};

/// Score given while the quality report is missing or unfinished
pub const DEFAULT_SCORE: u8 = 60;

/// Richness below this marks a thin repository
pub const RICHNESS_THRESHOLD: f64 = 50.0;

/// Floor of the thin-repository penalty
pub const PENALTY_FLOOR: f64 = 30.0;

pub fn evaluate(candidate: &Candidate) -> LayerOutcome {
    let report = candidate.reports.quality.as_ref();
    let report_status = status_of(report);

    let completed = report.filter(|r| r.is_completed());
    let Some((report, overall)) = completed.and_then(|r| r.overall_score.map(|s| (r, s))) else {
        return LayerOutcome::advance(
            DEFAULT_SCORE,
            "Quality analysis unavailable; default score applied",
            json!({
                "reportStatus": report_status,
                "defaultScore": true,
            }),
        );
    };

    let penalized = report
        .richness_score
        .is_some_and(|richness| richness < RICHNESS_THRESHOLD);

    let (raw, reason) = if penalized {
        (
            PENALTY_FLOOR.max(overall * 0.5),
            "Low code richness; quality score halved",
        )
    } else {
        (overall, "Quality score from analysis")
    };

    LayerOutcome::advance(
        clamp_score(raw),
        reason,
        json!({
            "reportStatus": report_status,
            "overallScore": overall,
            "richnessScore": report.richness_score,
            "richnessPenalty": penalized,
            "defaultScore": false,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CandidateReports, QualityReport, ReportStatus};
    use chrono::Utc;
    use uuid::Uuid;

    fn with_report(report: Option<QualityReport>) -> Candidate {
        Candidate {
            id: Uuid::new_v4(),
            hackathon_id: Uuid::new_v4(),
            name: "Widget".to_string(),
            github_url: None,
            submitted_at: None,
            category_id: None,
            category_name: None,
            reports: CandidateReports {
                quality: report,
                ..Default::default()
            },
        }
    }

    fn completed(overall: f64, richness: f64) -> Option<QualityReport> {
        Some(QualityReport {
            id: Uuid::new_v4(),
            status: ReportStatus::Completed,
            overall_score: Some(overall),
            richness_score: Some(richness),
            created_at: Utc::now(),
        })
    }

    #[test]
    fn test_default_when_missing_or_failed() {
        let outcome = evaluate(&with_report(None));
        assert_eq!(outcome.score, Some(60));
        assert_eq!(outcome.evidence["defaultScore"], true);

        let mut failed = completed(90.0, 90.0);
        if let Some(report) = failed.as_mut() {
            report.status = ReportStatus::Failed;
        }
        let outcome = evaluate(&with_report(failed));
        assert!(!outcome.eliminated);
        assert_eq!(outcome.score, Some(60));
        assert_eq!(outcome.evidence["reportStatus"], "FAILED");
    }

    #[test]
    fn test_rich_repository_keeps_overall() {
        let outcome = evaluate(&with_report(completed(84.0, 50.0)));
        assert_eq!(outcome.score, Some(84));
        assert_eq!(outcome.evidence["richnessPenalty"], false);
    }

    #[test]
    fn test_thin_repository_penalty_and_floor() {
        let outcome = evaluate(&with_report(completed(80.0, 20.0)));
        assert!(!outcome.eliminated);
        assert_eq!(outcome.score, Some(40));
        assert_eq!(outcome.evidence["richnessPenalty"], true);

        let outcome = evaluate(&with_report(completed(20.0, 10.0)));
        assert!(!outcome.eliminated);
        assert_eq!(outcome.score, Some(30));
    }
}
