//! Layer 1: eligibility
//!
//! Binary gate over submission and repository checks. A candidate failing any
//! configured check is eliminated with score 0; everyone else scores 100.
//!
//! Checks run in a fixed order and stop at the first failure:
//! submission present, submission before deadline, repository reference
//! parses, repository accessible, repository public.

use serde_json::{json, Map, Value};

use crate::models::{Candidate, EligibilityCriteria, LayerOutcome};
use crate::services::github_client::{parse_github_url, RepositoryError, RepositoryInspector};

const PASS_SCORE: u8 = 100;
const FAIL_SCORE: u8 = 0;

/// Evaluate one candidate against the session's criteria
///
/// Failures of a configured check become an eliminating outcome. Only a
/// failed repository lookup (network or decoding) is returned as an error;
/// the orchestrator turns it into an eliminating outcome of its own.
pub async fn evaluate(
    candidate: &Candidate,
    criteria: &EligibilityCriteria,
    inspector: &dyn RepositoryInspector,
) -> Result<LayerOutcome, RepositoryError> {
    let mut evidence = Map::new();
    evidence.insert("criteria".to_string(), json!(criteria));
    evidence.insert("submittedAt".to_string(), json!(candidate.submitted_at));

    if criteria.require_submission && candidate.submitted_at.is_none() {
        return Ok(fail(evidence, "submission", "Project has not been submitted"));
    }

    if let (Some(deadline), Some(submitted_at)) =
        (criteria.submission_deadline, candidate.submitted_at)
    {
        if submitted_at > deadline {
            return Ok(fail(
                evidence,
                "deadline",
                format!("Submitted after the deadline ({})", deadline.to_rfc3339()),
            ));
        }
    }

    let reference = candidate
        .github_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty());
    let Some(reference) = reference else {
        return Ok(fail(evidence, "repository", "No GitHub repository URL provided"));
    };

    let repo = match parse_github_url(reference) {
        Ok(repo) => repo,
        Err(e) => return Ok(fail(evidence, "repository", e.to_string())),
    };
    evidence.insert("repository".to_string(), json!(repo.to_string()));

    if criteria.needs_repository_lookup() {
        let access = inspector.inspect(&repo).await?;
        evidence.insert("accessible".to_string(), json!(access.accessible));
        evidence.insert("isPublic".to_string(), json!(access.is_public));

        if criteria.repository_access && !access.accessible {
            let reason = access
                .error
                .unwrap_or_else(|| "Repository is not accessible".to_string());
            return Ok(fail(evidence, "repositoryAccess", reason));
        }

        if criteria.require_public && !access.is_public {
            let reason = match access.error {
                Some(error) if !access.accessible => error,
                _ => "Repository is not public".to_string(),
            };
            return Ok(fail(evidence, "requirePublic", reason));
        }
    }

    Ok(LayerOutcome::advance(
        PASS_SCORE,
        "All eligibility checks passed",
        Value::Object(evidence),
    ))
}

fn fail(mut evidence: Map<String, Value>, check: &str, reason: impl Into<String>) -> LayerOutcome {
    evidence.insert("failedCheck".to_string(), json!(check));
    LayerOutcome::eliminate(FAIL_SCORE, reason, Value::Object(evidence))
}
