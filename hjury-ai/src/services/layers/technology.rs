//! Layer 2: technology detection
//!
//! Eliminates only on a completed report that found no use of the target
//! technology. Missing or unfinished reports get a neutral default.

use serde_json::json;

use crate::models::candidate::status_of;
use crate::models::{clamp_score, AnalysisReport, Candidate, LayerOutcome, TechnologyCategory};

/// Score given while the technology report is missing or unfinished
pub const DEFAULT_SCORE: u8 = 70;

pub fn evaluate(candidate: &Candidate) -> LayerOutcome {
    let report = candidate.reports.technology.as_ref();
    let report_status = status_of(report);

    let Some(report) = report.filter(|r| r.is_completed()) else {
        return LayerOutcome::advance(
            DEFAULT_SCORE,
            format!(
                "Technology analysis {}; default score applied",
                report_status.as_str().to_lowercase()
            ),
            json!({
                "reportStatus": report_status,
                "defaultScore": true,
            }),
        );
    };

    let evidence = json!({
        "reportStatus": report_status,
        "category": report.category,
        "confidence": report.confidence,
        "usageScore": report.usage_score,
        "defaultScore": false,
    });

    if report.category == Some(TechnologyCategory::NoTarget) {
        return LayerOutcome::eliminate(0, "Target technology not detected", evidence);
    }

    let raw = match (report.confidence, report.usage_score) {
        (Some(confidence), Some(usage)) => confidence.max(usage),
        (Some(value), None) | (None, Some(value)) => value,
        (None, None) => {
            return LayerOutcome::advance(
                DEFAULT_SCORE,
                "Technology analysis completed without scores; default score applied",
                json!({
                    "reportStatus": report_status,
                    "category": report.category,
                    "defaultScore": true,
                }),
            );
        }
    };

    let reason = match report.category {
        Some(TechnologyCategory::Target) => "Target technology detected",
        _ => "Related technology detected",
    };

    LayerOutcome::advance(clamp_score(raw), reason, evidence)
}
