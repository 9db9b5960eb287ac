//! Status aggregation — joins persisted evaluation records with candidate
//! and client metadata into a ranked per-interview overview.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::error::EvaluationError;
use crate::store::{Client, Database, EvaluationRecord, Interview};

/// How many candidates the ranking block shows.
pub const RANKING_SIZE: usize = 5;

/// One candidate's joined view: sourcing metadata plus analysis output.
#[derive(Debug, Clone)]
pub struct CandidateOverview {
    pub candidate_id: String,
    pub name: String,
    pub compatibility_score: f64,
    pub recommendation: String,
    pub tech_stack: Vec<String>,
    pub knowledge_level: Option<String>,
    pub practical_experience: Option<String>,
    pub fully_answered: i64,
    pub total_questions: i64,
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
    pub cv_url: Option<String>,
    pub alerts: Vec<String>,
}

impl CandidateOverview {
    /// Completeness percentage, rounded to one decimal. Zero questions is
    /// 0.0, not a division by zero.
    pub fn completeness_pct(&self) -> f64 {
        if self.total_questions <= 0 {
            return 0.0;
        }
        let pct = self.fully_answered as f64 / self.total_questions as f64 * 100.0;
        (pct * 10.0).round() / 10.0
    }
}

/// A ranking slot: position 1..=RANKING_SIZE.
#[derive(Debug, Clone)]
pub struct RankingSlot {
    pub position: usize,
    pub candidate_id: String,
    pub name: String,
    pub compatibility_score: f64,
}

/// The aggregated status of one interview.
#[derive(Debug, Clone)]
pub struct StatusOverview {
    pub interview: Interview,
    pub client: Client,
    /// All retained candidates, best score first.
    pub candidates: Vec<CandidateOverview>,
    /// Top candidates with positions.
    pub ranking: Vec<RankingSlot>,
    pub candidates_count: usize,
    /// Average compatibility score across all retained candidates,
    /// rounded to two decimals.
    pub avg_score: f64,
}

/// Builds status overviews from persisted evaluation records.
pub struct StatusAggregator {
    db: Arc<dyn Database>,
}

impl StatusAggregator {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// Aggregate the evaluations of one interview.
    ///
    /// Returns `Ok(None)` when no evaluation records exist yet. A missing
    /// interview, client, or candidate row is a data-integrity failure and
    /// surfaces as `NotFound`.
    pub async fn build_overview(
        &self,
        interview_id: &str,
    ) -> Result<Option<StatusOverview>, EvaluationError> {
        let records = self.db.evaluation_records_for_interview(interview_id).await?;
        if records.is_empty() {
            return Ok(None);
        }

        let interview = self
            .db
            .get_interview(interview_id)
            .await?
            .ok_or(EvaluationError::NotFound {
                entity: "interview",
                id: interview_id.to_string(),
            })?;

        let client = self
            .db
            .get_client(&interview.client_id)
            .await?
            .ok_or(EvaluationError::NotFound {
                entity: "client",
                id: interview.client_id.clone(),
            })?;

        // First record per candidate wins; re-evaluations within the same
        // interview are dropped.
        let mut retained: Vec<EvaluationRecord> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        for record in records {
            if seen.insert(record.candidate_id.clone()) {
                retained.push(record);
            } else {
                debug!(
                    candidate_id = %record.candidate_id,
                    record_id = %record.id,
                    "Dropping re-evaluation for already-seen candidate"
                );
            }
        }

        let mut candidates = Vec::with_capacity(retained.len());
        for record in &retained {
            let candidate = self
                .db
                .get_candidate(&record.candidate_id)
                .await?
                .ok_or(EvaluationError::NotFound {
                    entity: "candidate",
                    id: record.candidate_id.clone(),
                })?;
            candidates.push(join_candidate(record, candidate));
        }

        candidates.sort_by(|a, b| {
            b.compatibility_score
                .partial_cmp(&a.compatibility_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let ranking = candidates
            .iter()
            .take(RANKING_SIZE)
            .enumerate()
            .map(|(i, c)| RankingSlot {
                position: i + 1,
                candidate_id: c.candidate_id.clone(),
                name: c.name.clone(),
                compatibility_score: c.compatibility_score,
            })
            .collect();

        let candidates_count = candidates.len();
        let avg_score = if candidates_count == 0 {
            0.0
        } else {
            let total: f64 = candidates.iter().map(|c| c.compatibility_score).sum();
            let mean = total / candidates_count as f64;
            (mean * 100.0).round() / 100.0
        };

        Ok(Some(StatusOverview {
            interview,
            client,
            candidates,
            ranking,
            candidates_count,
            avg_score,
        }))
    }
}

/// Flatten an evaluation record and its candidate row into one view.
fn join_candidate(
    record: &EvaluationRecord,
    candidate: crate::store::Candidate,
) -> CandidateOverview {
    let assessment = &record.technical_assessment;
    let completeness = &record.completeness_summary;

    CandidateOverview {
        candidate_id: candidate.id,
        name: candidate.name,
        compatibility_score: record.match_evaluation.compatibility_score,
        recommendation: record.match_evaluation.final_recommendation.clone(),
        tech_stack: candidate.tech_stack,
        knowledge_level: json_str(assessment, "knowledge_level"),
        practical_experience: json_str(assessment, "practical_experience"),
        fully_answered: json_int(completeness, "fully_answered"),
        total_questions: json_int(completeness, "total_questions"),
        strengths: record.match_evaluation.strengths.clone(),
        concerns: record.match_evaluation.concerns.clone(),
        cv_url: candidate.cv_url,
        alerts: record.alerts.clone(),
    }
}

fn json_str(value: &serde_json::Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn json_int(value: &serde_json::Value, key: &str) -> i64 {
    value.get(key).and_then(serde_json::Value::as_i64).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    use crate::store::{Candidate, LibSqlBackend, MatchEvaluation};

    struct Fixture {
        db: Arc<LibSqlBackend>,
        aggregator: StatusAggregator,
        interview_id: String,
    }

    async fn fixture() -> Fixture {
        let db = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let client_id = db
            .resolve_or_insert_client("cliente@acme.com", "Acme", Some("Juan"), Some("5551234"))
            .await
            .unwrap();
        let interview_id = Uuid::new_v4().to_string();
        db.insert_interview(&crate::store::Interview {
            id: interview_id.clone(),
            name: "Backend Node".into(),
            description: String::new(),
            client_id,
            voice_agent_id: None,
            created_at: Utc::now(),
        })
        .await
        .unwrap();

        let aggregator = StatusAggregator::new(Arc::clone(&db) as Arc<dyn Database>);
        Fixture {
            db,
            aggregator,
            interview_id,
        }
    }

    async fn seed_candidate(db: &LibSqlBackend, id: &str, name: &str) {
        db.upsert_candidate(&Candidate {
            id: id.into(),
            name: name.into(),
            email: format!("{id}@mail.com"),
            phone: String::new(),
            tech_stack: vec!["React".into(), "Node".into()],
            cv_url: None,
        })
        .await
        .unwrap();
    }

    async fn seed_record(db: &LibSqlBackend, interview_id: &str, candidate_id: &str, score: f64) {
        db.insert_evaluation_record(&EvaluationRecord {
            id: String::new(),
            meet_id: interview_id.into(),
            candidate_id: candidate_id.into(),
            conversation_analysis: "ok".into(),
            technical_assessment: json!({"knowledge_level": "senior"}),
            completeness_summary: json!({"fully_answered": 8, "total_questions": 10}),
            alerts: vec![],
            match_evaluation: MatchEvaluation {
                compatibility_score: score,
                final_recommendation: "Recomendado".into(),
                ..Default::default()
            },
            created_at: Utc::now(),
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn no_records_yields_none() {
        let f = fixture().await;
        let overview = f.aggregator.build_overview(&f.interview_id).await.unwrap();
        assert!(overview.is_none());
    }

    #[tokio::test]
    async fn ranking_takes_top_five_descending() {
        let f = fixture().await;
        let scores = [90.0, 70.0, 85.0, 40.0, 60.0, 30.0];
        for (i, score) in scores.iter().enumerate() {
            let cid = format!("c{i}");
            seed_candidate(&f.db, &cid, &format!("Candidato {i}")).await;
            seed_record(&f.db, &f.interview_id, &cid, *score).await;
        }

        let overview = f
            .aggregator
            .build_overview(&f.interview_id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(overview.candidates_count, 6);
        let ranked: Vec<f64> = overview
            .ranking
            .iter()
            .map(|r| r.compatibility_score)
            .collect();
        assert_eq!(ranked, vec![90.0, 85.0, 70.0, 60.0, 40.0]);
        let positions: Vec<usize> = overview.ranking.iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn first_record_per_candidate_wins() {
        let f = fixture().await;
        seed_candidate(&f.db, "c1", "Ana").await;
        seed_record(&f.db, &f.interview_id, "c1", 50.0).await;
        seed_record(&f.db, &f.interview_id, "c1", 95.0).await;

        let overview = f
            .aggregator
            .build_overview(&f.interview_id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(overview.candidates_count, 1);
        assert_eq!(overview.candidates[0].compatibility_score, 50.0);
    }

    #[tokio::test]
    async fn average_is_over_all_retained_not_top_five() {
        let f = fixture().await;
        for (i, score) in [100.0, 100.0, 100.0, 100.0, 100.0, 10.0].iter().enumerate() {
            let cid = format!("c{i}");
            seed_candidate(&f.db, &cid, "X").await;
            seed_record(&f.db, &f.interview_id, &cid, *score).await;
        }

        let overview = f
            .aggregator
            .build_overview(&f.interview_id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(overview.avg_score, 85.0);
    }

    #[tokio::test]
    async fn missing_candidate_row_is_fatal() {
        let f = fixture().await;
        // Record references a candidate that was never seeded
        seed_record(&f.db, &f.interview_id, "ghost", 80.0).await;

        let result = f.aggregator.build_overview(&f.interview_id).await;
        assert!(matches!(
            result,
            Err(EvaluationError::NotFound { entity: "candidate", .. })
        ));
    }

    #[tokio::test]
    async fn completeness_guards_division_by_zero() {
        let overview = CandidateOverview {
            candidate_id: "c1".into(),
            name: "Ana".into(),
            compatibility_score: 80.0,
            recommendation: String::new(),
            tech_stack: vec![],
            knowledge_level: None,
            practical_experience: None,
            fully_answered: 0,
            total_questions: 0,
            strengths: vec![],
            concerns: vec![],
            cv_url: None,
            alerts: vec![],
        };
        assert_eq!(overview.completeness_pct(), 0.0);
    }

    #[tokio::test]
    async fn completeness_rounds_to_one_decimal() {
        let overview = CandidateOverview {
            candidate_id: "c1".into(),
            name: "Ana".into(),
            compatibility_score: 80.0,
            recommendation: String::new(),
            tech_stack: vec![],
            knowledge_level: None,
            practical_experience: None,
            fully_answered: 2,
            total_questions: 3,
            strengths: vec![],
            concerns: vec![],
            cv_url: None,
            alerts: vec![],
        };
        assert_eq!(overview.completeness_pct(), 66.7);
    }
}
