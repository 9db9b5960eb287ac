//! Evaluation result handling — normalization into a canonical shape and
//! idempotent persistence, one summary row per interview.

pub mod normalize;
pub mod persist;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

pub use normalize::{CandidateSummary, NormalizedEvaluation, RankingEntry, RawSection};
pub use persist::EvaluationWriter;

/// A persisted evaluation summary row, as read back from the store.
#[derive(Debug, Clone)]
pub struct StoredEvaluation {
    pub id: String,
    pub client_id: String,
    pub interview_id: String,
    pub summary: serde_json::Value,
    pub candidates: BTreeMap<String, CandidateSummary>,
    pub ranking: Vec<RankingEntry>,
    pub candidates_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
