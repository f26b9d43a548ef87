//! Final rankings cached on a completed session

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One advancing candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Winner {
    /// 1-based position inside the category
    pub rank: usize,
    pub candidate_id: Uuid,
    pub candidate_name: String,
    pub score: Option<u8>,
}

/// Advancing set for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWinners {
    /// None for candidates submitted without a category
    pub category_id: Option<Uuid>,
    pub category_name: String,
    /// Candidates that reached the final layer in this category
    pub candidate_count: usize,
    pub winners: Vec<Winner>,
}

/// Aggregate produced after the final layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalResults {
    pub per_category_winners: Vec<CategoryWinners>,
    pub generated_at: DateTime<Utc>,
    pub total_categories: usize,
    pub total_winners: usize,
}
