//! libSQL backend — async `Database` trait implementation.
//!
//! Supports local file and in-memory databases. Timestamps are stored as
//! RFC 3339 text; nested payloads (tech stacks, assessments, rankings) as
//! JSON text columns.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::evaluation::StoredEvaluation;
use crate::evaluation::normalize::NormalizedEvaluation;
use crate::store::migrations;
use crate::store::traits::{
    Candidate, Client, Database, EvaluationRecord, Interview, MatchEvaluation,
};

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, PersistenceError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                PersistenceError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| PersistenceError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| PersistenceError::Pool(format!("Failed to create connection: {e}")))?;

        migrations::run_migrations(&conn).await?;
        info!(path = %path.display(), "Database opened");

        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, PersistenceError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| PersistenceError::Pool(format!("Failed to create in-memory database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| PersistenceError::Pool(format!("Failed to create connection: {e}")))?;

        migrations::run_migrations(&conn).await?;

        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

/// Convert `Option<&str>` to a libsql Value.
fn opt_text(s: Option<&str>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s.to_string()),
        None => libsql::Value::Null,
    }
}

/// Parse a JSON text column, falling back to the given default on garbage.
fn parse_json_column<T: serde::de::DeserializeOwned>(raw: Option<String>, default: T) -> T {
    raw.and_then(|s| serde_json::from_str(&s).ok()).unwrap_or(default)
}

fn row_to_client(row: &libsql::Row) -> Result<Client, libsql::Error> {
    let created_str: String = row.get(5)?;
    Ok(Client {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        responsible: row.get(3).ok(),
        phone: row.get(4).ok(),
        created_at: parse_datetime(&created_str),
    })
}

fn row_to_interview(row: &libsql::Row) -> Result<Interview, libsql::Error> {
    let created_str: String = row.get(5)?;
    Ok(Interview {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        client_id: row.get(3)?,
        voice_agent_id: row.get(4).ok(),
        created_at: parse_datetime(&created_str),
    })
}

fn row_to_candidate(row: &libsql::Row) -> Result<Candidate, libsql::Error> {
    let tech_stack_str: Option<String> = row.get(4).ok();
    Ok(Candidate {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        tech_stack: parse_json_column(tech_stack_str, Vec::new()),
        cv_url: row.get(5).ok(),
    })
}

fn row_to_evaluation_record(row: &libsql::Row) -> Result<EvaluationRecord, libsql::Error> {
    let technical_str: Option<String> = row.get(4).ok();
    let completeness_str: Option<String> = row.get(5).ok();
    let alerts_str: Option<String> = row.get(6).ok();
    let match_str: Option<String> = row.get(7).ok();
    let created_str: String = row.get(8)?;

    Ok(EvaluationRecord {
        id: row.get(0)?,
        meet_id: row.get(1)?,
        candidate_id: row.get(2)?,
        conversation_analysis: row.get(3)?,
        technical_assessment: parse_json_column(technical_str, serde_json::json!({})),
        completeness_summary: parse_json_column(completeness_str, serde_json::json!({})),
        alerts: parse_json_column(alerts_str, Vec::new()),
        match_evaluation: parse_json_column(match_str, MatchEvaluation::default()),
        created_at: parse_datetime(&created_str),
    })
}

fn row_to_stored_evaluation(row: &libsql::Row) -> Result<StoredEvaluation, libsql::Error> {
    let summary_str: Option<String> = row.get(3).ok();
    let candidates_str: Option<String> = row.get(4).ok();
    let ranking_str: Option<String> = row.get(5).ok();
    let created_str: String = row.get(7)?;
    let updated_str: String = row.get(8)?;

    Ok(StoredEvaluation {
        id: row.get(0)?,
        client_id: row.get(1)?,
        interview_id: row.get(2)?,
        summary: parse_json_column(summary_str, serde_json::json!({})),
        candidates: parse_json_column(candidates_str, Default::default()),
        ranking: parse_json_column(ranking_str, Vec::new()),
        candidates_count: row.get(6)?,
        created_at: parse_datetime(&created_str),
        updated_at: parse_datetime(&updated_str),
    })
}

// ── Trait implementation ────────────────────────────────────────────

const CLIENT_COLUMNS: &str = "id, email, name, responsible, phone, created_at";

const INTERVIEW_COLUMNS: &str = "id, name, description, client_id, voice_agent_id, created_at";

const CANDIDATE_COLUMNS: &str = "id, name, email, phone, tech_stack, cv_url";

const EVALUATION_RECORD_COLUMNS: &str = "id, meet_id, candidate_id, conversation_analysis, \
     technical_assessment, completeness_summary, alerts, match_evaluation, created_at";

const EVALUATION_COLUMNS: &str = "id, client_id, interview_id, summary, candidates, ranking, \
     candidates_count, created_at, updated_at";

#[async_trait]
impl Database for LibSqlBackend {
    // ── Clients ─────────────────────────────────────────────────────

    async fn resolve_or_insert_client(
        &self,
        email: &str,
        name: &str,
        responsible: Option<&str>,
        phone: Option<&str>,
    ) -> Result<String, PersistenceError> {
        let conn = self.conn();
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        // The UNIQUE constraint on email makes this race-safe: a concurrent
        // first sighting loses the insert and the follow-up select finds
        // the winner's row.
        conn.execute(
            "INSERT INTO clients (id, email, name, responsible, phone, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(email) DO NOTHING",
            params![
                id.clone(),
                email,
                name,
                opt_text(responsible),
                opt_text(phone),
                now,
            ],
        )
        .await
        .map_err(|e| PersistenceError::Query(format!("resolve_or_insert_client: {e}")))?;

        let mut rows = conn
            .query(
                "SELECT id FROM clients WHERE email = ?1",
                params![email],
            )
            .await
            .map_err(|e| PersistenceError::Query(format!("resolve_or_insert_client: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let found: String = row
                    .get(0)
                    .map_err(|e| PersistenceError::Query(e.to_string()))?;
                if found == id {
                    debug!(client_id = %found, email = email, "Client created");
                } else {
                    debug!(client_id = %found, email = email, "Client already exists");
                }
                Ok(found)
            }
            Ok(None) => Err(PersistenceError::Query(
                "resolve_or_insert_client: row vanished after insert".into(),
            )),
            Err(e) => Err(PersistenceError::Query(format!(
                "resolve_or_insert_client: {e}"
            ))),
        }
    }

    async fn get_client(&self, id: &str) -> Result<Option<Client>, PersistenceError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = ?1"),
                params![id],
            )
            .await
            .map_err(|e| PersistenceError::Query(format!("get_client: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => row_to_client(&row)
                .map(Some)
                .map_err(|e| PersistenceError::Query(format!("get_client row parse: {e}"))),
            Ok(None) => Ok(None),
            Err(e) => Err(PersistenceError::Query(format!("get_client: {e}"))),
        }
    }

    async fn get_client_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Client>, PersistenceError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE email = ?1"),
                params![email],
            )
            .await
            .map_err(|e| PersistenceError::Query(format!("get_client_by_email: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => row_to_client(&row).map(Some).map_err(|e| {
                PersistenceError::Query(format!("get_client_by_email row parse: {e}"))
            }),
            Ok(None) => Ok(None),
            Err(e) => Err(PersistenceError::Query(format!("get_client_by_email: {e}"))),
        }
    }

    // ── Interviews ──────────────────────────────────────────────────

    async fn insert_interview(&self, interview: &Interview) -> Result<(), PersistenceError> {
        self.conn()
            .execute(
                "INSERT INTO interviews (id, name, description, client_id, voice_agent_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    interview.id.clone(),
                    interview.name.clone(),
                    interview.description.clone(),
                    interview.client_id.clone(),
                    opt_text(interview.voice_agent_id.as_deref()),
                    interview.created_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| PersistenceError::Query(format!("insert_interview: {e}")))?;

        debug!(interview_id = %interview.id, "Interview inserted into DB");
        Ok(())
    }

    async fn get_interview(&self, id: &str) -> Result<Option<Interview>, PersistenceError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {INTERVIEW_COLUMNS} FROM interviews WHERE id = ?1"),
                params![id],
            )
            .await
            .map_err(|e| PersistenceError::Query(format!("get_interview: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => row_to_interview(&row)
                .map(Some)
                .map_err(|e| PersistenceError::Query(format!("get_interview row parse: {e}"))),
            Ok(None) => Ok(None),
            Err(e) => Err(PersistenceError::Query(format!("get_interview: {e}"))),
        }
    }

    // ── Candidates ──────────────────────────────────────────────────

    async fn get_candidate(&self, id: &str) -> Result<Option<Candidate>, PersistenceError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {CANDIDATE_COLUMNS} FROM candidates WHERE id = ?1"),
                params![id],
            )
            .await
            .map_err(|e| PersistenceError::Query(format!("get_candidate: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => row_to_candidate(&row)
                .map(Some)
                .map_err(|e| PersistenceError::Query(format!("get_candidate row parse: {e}"))),
            Ok(None) => Ok(None),
            Err(e) => Err(PersistenceError::Query(format!("get_candidate: {e}"))),
        }
    }

    async fn upsert_candidate(&self, candidate: &Candidate) -> Result<(), PersistenceError> {
        let tech_stack = serde_json::to_string(&candidate.tech_stack)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;

        self.conn()
            .execute(
                "INSERT INTO candidates (id, name, email, phone, tech_stack, cv_url)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    email = excluded.email,
                    phone = excluded.phone,
                    tech_stack = excluded.tech_stack,
                    cv_url = excluded.cv_url",
                params![
                    candidate.id.clone(),
                    candidate.name.clone(),
                    candidate.email.clone(),
                    candidate.phone.clone(),
                    tech_stack,
                    opt_text(candidate.cv_url.as_deref()),
                ],
            )
            .await
            .map_err(|e| PersistenceError::Query(format!("upsert_candidate: {e}")))?;

        Ok(())
    }

    // ── Evaluation records ──────────────────────────────────────────

    async fn insert_evaluation_record(
        &self,
        record: &EvaluationRecord,
    ) -> Result<String, PersistenceError> {
        let id = if record.id.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            record.id.clone()
        };

        let alerts = serde_json::to_string(&record.alerts)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;
        let match_evaluation = serde_json::to_string(&record.match_evaluation)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;

        self.conn()
            .execute(
                "INSERT INTO evaluation_records (id, meet_id, candidate_id, conversation_analysis,
                    technical_assessment, completeness_summary, alerts, match_evaluation, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    id.clone(),
                    record.meet_id.clone(),
                    record.candidate_id.clone(),
                    record.conversation_analysis.clone(),
                    record.technical_assessment.to_string(),
                    record.completeness_summary.to_string(),
                    alerts,
                    match_evaluation,
                    record.created_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| PersistenceError::Query(format!("insert_evaluation_record: {e}")))?;

        debug!(record_id = %id, meet_id = %record.meet_id, "Evaluation record inserted");
        Ok(id)
    }

    async fn evaluation_records_for_interview(
        &self,
        interview_id: &str,
    ) -> Result<Vec<EvaluationRecord>, PersistenceError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {EVALUATION_RECORD_COLUMNS} FROM evaluation_records
                     WHERE meet_id = ?1 ORDER BY created_at ASC, id ASC"
                ),
                params![interview_id],
            )
            .await
            .map_err(|e| {
                PersistenceError::Query(format!("evaluation_records_for_interview: {e}"))
            })?;

        let mut records = Vec::new();
        loop {
            match rows.next().await {
                Ok(Some(row)) => {
                    let record = row_to_evaluation_record(&row).map_err(|e| {
                        PersistenceError::Query(format!(
                            "evaluation_records_for_interview row parse: {e}"
                        ))
                    })?;
                    records.push(record);
                }
                Ok(None) => break,
                Err(e) => {
                    return Err(PersistenceError::Query(format!(
                        "evaluation_records_for_interview: {e}"
                    )));
                }
            }
        }
        Ok(records)
    }

    // ── Persisted evaluation summaries ──────────────────────────────

    async fn upsert_evaluation(
        &self,
        client_id: &str,
        interview_id: &str,
        normalized: &NormalizedEvaluation,
    ) -> Result<String, PersistenceError> {
        let candidates = serde_json::to_string(&normalized.candidates)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;
        let ranking = serde_json::to_string(&normalized.ranking)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        // One row per interview: the UNIQUE constraint plus ON CONFLICT
        // makes repeated saves converge to a single row holding the latest
        // payload. RETURNING yields the surviving row's id either way.
        let mut rows = self
            .conn()
            .query(
                "INSERT INTO evaluations (id, client_id, interview_id, summary, candidates,
                    ranking, candidates_count, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
                 ON CONFLICT(interview_id) DO UPDATE SET
                    summary = excluded.summary,
                    candidates = excluded.candidates,
                    ranking = excluded.ranking,
                    candidates_count = excluded.candidates_count,
                    updated_at = excluded.updated_at
                 RETURNING id",
                params![
                    id,
                    client_id,
                    interview_id,
                    normalized.summary.to_string(),
                    candidates,
                    ranking,
                    normalized.candidates_count,
                    now,
                ],
            )
            .await
            .map_err(|e| PersistenceError::Query(format!("upsert_evaluation: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let saved: String = row
                    .get(0)
                    .map_err(|e| PersistenceError::Query(e.to_string()))?;
                debug!(evaluation_id = %saved, interview_id = interview_id, "Evaluation upserted");
                Ok(saved)
            }
            Ok(None) => Err(PersistenceError::Query(
                "upsert_evaluation: no row returned".into(),
            )),
            Err(e) => Err(PersistenceError::Query(format!("upsert_evaluation: {e}"))),
        }
    }

    async fn get_evaluation_for_interview(
        &self,
        interview_id: &str,
    ) -> Result<Option<StoredEvaluation>, PersistenceError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {EVALUATION_COLUMNS} FROM evaluations
                     WHERE interview_id = ?1 ORDER BY updated_at DESC LIMIT 1"
                ),
                params![interview_id],
            )
            .await
            .map_err(|e| PersistenceError::Query(format!("get_evaluation_for_interview: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => row_to_stored_evaluation(&row).map(Some).map_err(|e| {
                PersistenceError::Query(format!("get_evaluation_for_interview row parse: {e}"))
            }),
            Ok(None) => Ok(None),
            Err(e) => Err(PersistenceError::Query(format!(
                "get_evaluation_for_interview: {e}"
            ))),
        }
    }
}
