//! Evaluation persistence — resolve the interview linkage, normalize the
//! raw sections, and upsert the single summary row for the interview.

use std::sync::Arc;

use tracing::info;

use crate::error::EvaluationError;
use crate::evaluation::normalize::{self, RawSection};
use crate::store::Database;

/// Saves normalized evaluation summaries, one row per interview.
pub struct EvaluationWriter {
    db: Arc<dyn Database>,
}

impl EvaluationWriter {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// Normalize and persist an evaluation result for one interview.
    ///
    /// Fails with `NotFound` when the interview does not exist or carries
    /// no client linkage — an evaluation is never saved without a client.
    /// Repeated calls for the same interview converge to a single row
    /// reflecting the latest payload; the returned id is stable across
    /// updates.
    pub async fn save_evaluation(
        &self,
        interview_id: &str,
        raw_summary: Option<RawSection>,
        raw_candidates: Option<RawSection>,
        raw_ranking: Option<RawSection>,
        candidates_count: Option<i64>,
    ) -> Result<String, EvaluationError> {
        let interview = self
            .db
            .get_interview(interview_id)
            .await?
            .ok_or(EvaluationError::NotFound {
                entity: "interview",
                id: interview_id.to_string(),
            })?;

        if interview.client_id.trim().is_empty() {
            return Err(EvaluationError::NotFound {
                entity: "client",
                id: format!("(for interview {interview_id})"),
            });
        }

        let normalized =
            normalize::normalize(raw_summary, raw_candidates, raw_ranking, candidates_count)?;

        let evaluation_id = self
            .db
            .upsert_evaluation(&interview.client_id, interview_id, &normalized)
            .await?;

        info!(
            evaluation_id = %evaluation_id,
            interview_id = interview_id,
            candidates = normalized.candidates_count,
            "Evaluation saved"
        );
        Ok(evaluation_id)
    }
}
