//! Unified `Database` trait — single async interface for all persistence.
//!
//! Row structs live here alongside the trait. Candidates and evaluation
//! records are owned by external collaborators (candidate sourcing and the
//! LLM analysis step); this crate reads them and only writes them from
//! tests and seeding paths.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;
use crate::evaluation::normalize::NormalizedEvaluation;
use crate::evaluation::StoredEvaluation;

/// A client (hiring company) record. `email` is the unique business key;
/// re-creation attempts short-circuit to the existing row.
#[derive(Debug, Clone)]
pub struct Client {
    pub id: String,
    pub email: String,
    pub name: String,
    pub responsible: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A job interview (posting) record. Append-only.
#[derive(Debug, Clone)]
pub struct Interview {
    pub id: String,
    pub name: String,
    pub description: String,
    pub client_id: String,
    /// Absent when upstream voice-agent provisioning failed.
    pub voice_agent_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A candidate record, owned by the sourcing collaborator. Read-only here.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub tech_stack: Vec<String>,
    pub cv_url: Option<String>,
}

/// Match verdict produced by the analysis collaborator for one candidate.
///
/// Treated as already validated; absent fields deserialize to defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchEvaluation {
    #[serde(default)]
    pub compatibility_score: f64,
    #[serde(default)]
    pub final_recommendation: String,
    #[serde(default)]
    pub justification: String,
    #[serde(default)]
    pub is_potential_match: bool,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub concerns: Vec<String>,
}

/// One candidate's analysis result for one interview, written by the
/// analysis collaborator and read by the status aggregator.
///
/// `meet_id` is the interview linkage under the collaborator's own
/// vocabulary; nested assessment payloads stay as opaque JSON.
#[derive(Debug, Clone)]
pub struct EvaluationRecord {
    pub id: String,
    pub meet_id: String,
    pub candidate_id: String,
    pub conversation_analysis: String,
    pub technical_assessment: serde_json::Value,
    pub completeness_summary: serde_json::Value,
    pub alerts: Vec<String>,
    pub match_evaluation: MatchEvaluation,
    pub created_at: DateTime<Utc>,
}

/// Backend-agnostic database trait covering clients, interviews,
/// candidates, evaluation records, and persisted evaluation summaries.
#[async_trait]
pub trait Database: Send + Sync {
    // ── Clients ─────────────────────────────────────────────────────

    /// Atomic resolve-or-create keyed on `email`: insert-or-ignore against
    /// the unique email constraint, then fetch. First write wins — an
    /// existing row is returned unchanged, request fields are not applied.
    async fn resolve_or_insert_client(
        &self,
        email: &str,
        name: &str,
        responsible: Option<&str>,
        phone: Option<&str>,
    ) -> Result<String, PersistenceError>;

    /// Get a client by ID.
    async fn get_client(&self, id: &str) -> Result<Option<Client>, PersistenceError>;

    /// Look up a client by its email business key.
    async fn get_client_by_email(&self, email: &str)
    -> Result<Option<Client>, PersistenceError>;

    // ── Interviews ──────────────────────────────────────────────────

    /// Insert a new interview record (append-only).
    async fn insert_interview(&self, interview: &Interview) -> Result<(), PersistenceError>;

    /// Get an interview by ID.
    async fn get_interview(&self, id: &str) -> Result<Option<Interview>, PersistenceError>;

    // ── Candidates (externally owned) ───────────────────────────────

    /// Get a candidate by ID.
    async fn get_candidate(&self, id: &str) -> Result<Option<Candidate>, PersistenceError>;

    /// Insert or replace a candidate row. Seeding path for the sourcing
    /// collaborator and tests.
    async fn upsert_candidate(&self, candidate: &Candidate) -> Result<(), PersistenceError>;

    // ── Evaluation records (analysis collaborator output) ───────────

    /// Insert one analysis result. Returns the generated row id.
    async fn insert_evaluation_record(
        &self,
        record: &EvaluationRecord,
    ) -> Result<String, PersistenceError>;

    /// All analysis results for one interview, oldest first.
    async fn evaluation_records_for_interview(
        &self,
        interview_id: &str,
    ) -> Result<Vec<EvaluationRecord>, PersistenceError>;

    // ── Persisted evaluation summaries ──────────────────────────────

    /// Atomic upsert keyed on `interview_id`; at most one row per
    /// interview. Returns the row id (existing id on update).
    async fn upsert_evaluation(
        &self,
        client_id: &str,
        interview_id: &str,
        normalized: &NormalizedEvaluation,
    ) -> Result<String, PersistenceError>;

    /// Get the persisted summary for an interview, if any.
    async fn get_evaluation_for_interview(
        &self,
        interview_id: &str,
    ) -> Result<Option<StoredEvaluation>, PersistenceError>;
}
