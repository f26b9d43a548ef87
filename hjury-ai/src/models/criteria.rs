//! Eligibility criteria consumed by layer 1

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hjury_common::Error;

/// Checks a project must pass to stay in the tournament
///
/// Stored on the session as the JSON the organizer submitted; decoded when
/// layer 1 runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EligibilityCriteria {
    /// Project must have been submitted
    pub require_submission: bool,

    /// Latest accepted submission time
    pub submission_deadline: Option<DateTime<Utc>>,

    /// Repository must be reachable through the GitHub API
    pub repository_access: bool,

    /// Repository must be public
    pub require_public: bool,
}

impl Default for EligibilityCriteria {
    fn default() -> Self {
        Self {
            require_submission: true,
            submission_deadline: None,
            repository_access: false,
            require_public: false,
        }
    }
}

impl EligibilityCriteria {
    /// Decode criteria from the session blob; `null` means defaults
    pub fn from_value(value: &serde_json::Value) -> Result<Self, Error> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value.clone())
            .map_err(|e| Error::InvalidInput(format!("Invalid eligibility criteria: {}", e)))
    }

    /// Whether a GitHub API call is needed at all
    pub fn needs_repository_lookup(&self) -> bool {
        self.repository_access || self.require_public
    }
}
