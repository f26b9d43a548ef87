//! Final ranking: top K layer-4 candidates per category

use chrono::Utc;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::models::{CategoryWinners, FinalResults, Winner};

/// Label used for candidates submitted without a category
pub const UNCATEGORIZED: &str = "uncategorized";

/// One layer-4 result joined with its candidate's category
#[derive(Debug, Clone, PartialEq)]
pub struct RankingEntry {
    pub candidate_id: Uuid,
    pub candidate_name: String,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub score: Option<u8>,
}

/// Score descending, missing scores last, then candidate id ascending
fn rank_order(a: &RankingEntry, b: &RankingEntry) -> Ordering {
    match (a.score, b.score) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.candidate_id.cmp(&b.candidate_id))
}

/// Group entries by category and keep the `top_k` best of each
///
/// Categories are listed by name (uncategorized last) so the output is stable
/// for identical inputs.
pub fn aggregate(entries: Vec<RankingEntry>, top_k: usize) -> FinalResults {
    // (uncategorized?, name, id) sorts named categories first
    let mut groups: BTreeMap<(bool, String, Option<Uuid>), Vec<RankingEntry>> = BTreeMap::new();
    for entry in entries {
        let key = match entry.category_id {
            Some(id) => (
                false,
                entry.category_name.clone().unwrap_or_else(|| id.to_string()),
                Some(id),
            ),
            None => (true, UNCATEGORIZED.to_string(), None),
        };
        groups.entry(key).or_default().push(entry);
    }

    let per_category_winners: Vec<CategoryWinners> = groups
        .into_iter()
        .map(|((_, category_name, category_id), mut members)| {
            members.sort_by(rank_order);
            let candidate_count = members.len();
            let winners = members
                .into_iter()
                .take(top_k)
                .enumerate()
                .map(|(index, entry)| Winner {
                    rank: index + 1,
                    candidate_id: entry.candidate_id,
                    candidate_name: entry.candidate_name,
                    score: entry.score,
                })
                .collect();

            CategoryWinners {
                category_id,
                category_name,
                candidate_count,
                winners,
            }
        })
        .collect();

    let total_winners = per_category_winners.iter().map(|c| c.winners.len()).sum();

    FinalResults {
        total_categories: per_category_winners.len(),
        total_winners,
        per_category_winners,
        generated_at: Utc::now(),
    }
}
