//! Candidates and the external analysis reports attached to them
//!
//! Reports are produced asynchronously by other services; the jury only reads
//! the most recently created report of each kind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use hjury_common::Error;

/// Lifecycle of an external analysis report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    Missing,
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl ReportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportStatus::Missing => "MISSING",
            ReportStatus::Pending => "PENDING",
            ReportStatus::InProgress => "IN_PROGRESS",
            ReportStatus::Completed => "COMPLETED",
            ReportStatus::Failed => "FAILED",
        }
    }
}

impl FromStr for ReportStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MISSING" => Ok(ReportStatus::Missing),
            "PENDING" => Ok(ReportStatus::Pending),
            "IN_PROGRESS" => Ok(ReportStatus::InProgress),
            "COMPLETED" => Ok(ReportStatus::Completed),
            "FAILED" => Ok(ReportStatus::Failed),
            other => Err(Error::Internal(format!("Unknown report status: {}", other))),
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict of the technology detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TechnologyCategory {
    /// Project uses the hackathon's target technology
    Target,
    /// Project uses a related technology other than the target
    Other,
    /// Project shows no use of the target technology
    NoTarget,
}

impl TechnologyCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            TechnologyCategory::Target => "TARGET",
            TechnologyCategory::Other => "OTHER",
            TechnologyCategory::NoTarget => "NO_TARGET",
        }
    }
}

impl FromStr for TechnologyCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TARGET" => Ok(TechnologyCategory::Target),
            "OTHER" => Ok(TechnologyCategory::Other),
            "NO_TARGET" => Ok(TechnologyCategory::NoTarget),
            other => Err(Error::Internal(format!(
                "Unknown technology category: {}",
                other
            ))),
        }
    }
}

/// Common accessors used to pick the freshest report
pub trait AnalysisReport {
    fn status(&self) -> ReportStatus;
    fn created_at(&self) -> DateTime<Utc>;
    fn id(&self) -> Uuid;

    fn is_completed(&self) -> bool {
        self.status() == ReportStatus::Completed
    }
}

/// Technology detection report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnologyReport {
    pub id: Uuid,
    pub status: ReportStatus,
    pub category: Option<TechnologyCategory>,
    pub confidence: Option<f64>,
    pub usage_score: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Code quality report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub id: Uuid,
    pub status: ReportStatus,
    pub overall_score: Option<f64>,
    /// How much substantive code the repository carries (0-100)
    pub richness_score: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Single-score qualitative report (coherence or innovation)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub id: Uuid,
    pub status: ReportStatus,
    pub score: Option<f64>,
    pub created_at: DateTime<Utc>,
}

macro_rules! impl_analysis_report {
    ($($ty:ty),*) => {
        $(impl AnalysisReport for $ty {
            fn status(&self) -> ReportStatus {
                self.status
            }

            fn created_at(&self) -> DateTime<Utc> {
                self.created_at
            }

            fn id(&self) -> Uuid {
                self.id
            }
        })*
    };
}

impl_analysis_report!(TechnologyReport, QualityReport, ScoreReport);

/// Keep `incoming` in `slot` when it is newer than what is there
///
/// Reports created at the same instant are ordered by id, so the pick does
/// not depend on the order rows come back in.
pub fn keep_latest<R: AnalysisReport>(slot: &mut Option<R>, incoming: R) {
    let newer = slot.as_ref().map_or(true, |current| {
        (incoming.created_at(), incoming.id()) > (current.created_at(), current.id())
    });
    if newer {
        *slot = Some(incoming);
    }
}

/// Latest report of each kind for one candidate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateReports {
    pub technology: Option<TechnologyReport>,
    pub quality: Option<QualityReport>,
    pub coherence: Option<ScoreReport>,
    pub innovation: Option<ScoreReport>,
}

/// A submitted project under evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: Uuid,
    pub hackathon_id: Uuid,
    pub name: String,
    pub github_url: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    #[serde(default)]
    pub reports: CandidateReports,
}

/// Report status for evidence payloads (MISSING when there is no report)
pub fn status_of<R: AnalysisReport>(report: Option<&R>) -> ReportStatus {
    report.map_or(ReportStatus::Missing, AnalysisReport::status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn score_report(score: f64, age_minutes: i64) -> ScoreReport {
        ScoreReport {
            id: Uuid::new_v4(),
            status: ReportStatus::Completed,
            score: Some(score),
            created_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    fn report_at(id: Uuid, score: f64, created_at: DateTime<Utc>) -> ScoreReport {
        ScoreReport {
            id,
            status: ReportStatus::Completed,
            score: Some(score),
            created_at,
        }
    }

    #[test]
    fn test_keep_latest_ignores_older() {
        let mut slot = None;
        keep_latest(&mut slot, score_report(40.0, 5));
        keep_latest(&mut slot, score_report(10.0, 60));
        assert_eq!(slot.as_ref().unwrap().score, Some(40.0));
        keep_latest(&mut slot, score_report(70.0, 0));
        assert_eq!(slot.unwrap().score, Some(70.0));
    }

    #[test]
    fn test_keep_latest_same_instant_is_order_independent() {
        let at = Utc::now();
        let low = Uuid::from_u128(1);
        let high = Uuid::from_u128(2);

        let mut forward = None;
        keep_latest(&mut forward, report_at(low, 10.0, at));
        keep_latest(&mut forward, report_at(high, 90.0, at));

        let mut backward = None;
        keep_latest(&mut backward, report_at(high, 90.0, at));
        keep_latest(&mut backward, report_at(low, 10.0, at));

        assert_eq!(forward.unwrap().id, high);
        assert_eq!(backward.unwrap().id, high);
    }

    #[test]
    fn test_status_text_round_trip() {
        for status in [
            ReportStatus::Missing,
            ReportStatus::Pending,
            ReportStatus::InProgress,
            ReportStatus::Completed,
            ReportStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<ReportStatus>().unwrap(), status);
        }
        assert_eq!(
            "NO_TARGET".parse::<TechnologyCategory>().unwrap(),
            TechnologyCategory::NoTarget
        );
    }

    #[test]
    fn test_status_of_missing_report() {
        assert_eq!(status_of::<ScoreReport>(None), ReportStatus::Missing);
    }
}
