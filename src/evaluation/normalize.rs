//! Normalization of loosely-shaped evaluation payloads.
//!
//! The analysis pipeline hands over three sections — summary, candidates,
//! ranking — each arriving either as structured JSON or as a JSON-encoded
//! string. Shape questions are settled here, once, at the ingress boundary:
//! a section that fails to parse is rejected, and every field downstream of
//! the parse gets an explicit default instead of a guess.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EvaluationError;

/// Match-level labels by compatibility score.
pub const MATCH_EXCELLENT: &str = "EXCELENTE";
pub const MATCH_GOOD: &str = "BUENO";
pub const MATCH_MODERATE: &str = "MODERADO";
pub const MATCH_WEAK: &str = "DÉBIL";

/// Recommendation applied when the analysis did not provide one.
pub const DEFAULT_RECOMMENDATION: &str = "Condicional";

/// Maximum key strengths kept per ranking entry.
const MAX_KEY_STRENGTHS: usize = 4;

/// Alias fields the analysis pipeline has been seen using for strengths.
const STRENGTH_ALIASES: &[&str] = &["strengths", "fortalezas", "fortalezas_clave"];

// ── Raw ingress ─────────────────────────────────────────────────────

/// One raw payload section: structured JSON or a JSON-encoded string.
///
/// `Encoded` must come first so untagged deserialization routes JSON
/// strings here instead of swallowing them as `Value::String`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawSection {
    Encoded(String),
    Structured(Value),
}

impl RawSection {
    /// Resolve to a JSON value. A malformed encoded string is an
    /// `InvalidShape` error — nothing downstream sees unparsed text.
    pub fn into_value(self, section: &'static str) -> Result<Value, EvaluationError> {
        match self {
            RawSection::Structured(v) => Ok(v),
            RawSection::Encoded(s) => serde_json::from_str(&s).map_err(|e| {
                EvaluationError::InvalidShape(format!("{section}: {e}"))
            }),
        }
    }
}

impl From<Value> for RawSection {
    fn from(v: Value) -> Self {
        RawSection::Structured(v)
    }
}

impl From<&str> for RawSection {
    fn from(s: &str) -> Self {
        RawSection::Encoded(s.to_string())
    }
}

// ── Canonical shapes ────────────────────────────────────────────────

/// Canonical per-candidate entry in the persisted `candidates` map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub name: String,
    pub score: i64,
    pub recommendation: String,
}

/// Canonical ranking entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub candidate_id: String,
    pub name: String,
    pub score: i64,
    pub analysis: String,
    pub match_level: String,
    pub key_strengths: Vec<String>,
}

/// The full normalized evaluation, ready to persist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedEvaluation {
    pub summary: Value,
    pub candidates: BTreeMap<String, CandidateSummary>,
    pub ranking: Vec<RankingEntry>,
    pub candidates_count: i64,
}

// ── Coercions ───────────────────────────────────────────────────────

/// Coerce a JSON value to an integer score. Numbers truncate, numeric
/// strings parse, anything else is 0.
fn coerce_score(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().map(|f| f as i64))
                .unwrap_or(0)
        }
        _ => 0,
    }
}

/// Match level for a compatibility score.
pub fn match_level_for(score: i64) -> &'static str {
    if score >= 80 {
        MATCH_EXCELLENT
    } else if score >= 70 {
        MATCH_GOOD
    } else if score >= 60 {
        MATCH_MODERATE
    } else {
        MATCH_WEAK
    }
}

fn string_field(entry: &Value, key: &str) -> Option<String> {
    entry
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Key strengths from whichever alias field is present: a JSON array, a
/// JSON-encoded array string, or a comma-separated string. Capped at four.
fn parse_key_strengths(entry: &Value) -> Vec<String> {
    let mut strengths: Vec<String> = Vec::new();

    for alias in STRENGTH_ALIASES {
        match entry.get(alias) {
            Some(Value::Array(items)) => {
                strengths = items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect();
            }
            Some(Value::String(s)) => {
                strengths = serde_json::from_str::<Vec<String>>(s).unwrap_or_else(|_| {
                    s.split(',')
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .map(str::to_string)
                        .collect()
                });
            }
            _ => continue,
        }
        break;
    }

    strengths.truncate(MAX_KEY_STRENGTHS);
    strengths
}

// ── Section normalizers ─────────────────────────────────────────────

/// Normalize the candidates map. A missing or null section is an empty
/// map; anything else must be a JSON object keyed by candidate id.
fn normalize_candidates(
    raw: Option<Value>,
) -> Result<BTreeMap<String, CandidateSummary>, EvaluationError> {
    let value = match raw {
        None | Some(Value::Null) => return Ok(BTreeMap::new()),
        Some(v) => v,
    };

    let map = value.as_object().ok_or_else(|| {
        EvaluationError::InvalidShape("candidates: expected an object keyed by candidate id".into())
    })?;

    let mut candidates = BTreeMap::new();
    for (candidate_id, entry) in map {
        candidates.insert(
            candidate_id.clone(),
            CandidateSummary {
                name: string_field(entry, "name").unwrap_or_default(),
                score: coerce_score(entry.get("score")),
                recommendation: string_field(entry, "recommendation")
                    .unwrap_or_else(|| DEFAULT_RECOMMENDATION.to_string()),
            },
        );
    }
    Ok(candidates)
}

/// Normalize the ranking. A supplied non-empty array is trusted as given
/// (order preserved); missing/null/empty falls back to deriving one from
/// the candidates map, sorted by score descending.
fn normalize_ranking(
    raw: Option<Value>,
    candidates: &BTreeMap<String, CandidateSummary>,
) -> Result<Vec<RankingEntry>, EvaluationError> {
    let entries = match raw {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(entries)) => entries,
        Some(_) => {
            return Err(EvaluationError::InvalidShape(
                "ranking: expected an array".into(),
            ));
        }
    };

    if entries.is_empty() {
        return Ok(derive_ranking(candidates));
    }

    let ranking = entries
        .iter()
        .map(|entry| {
            let score = coerce_score(entry.get("score"));
            RankingEntry {
                candidate_id: string_field(entry, "candidate_id")
                    .or_else(|| string_field(entry, "id"))
                    .unwrap_or_default(),
                name: string_field(entry, "name").unwrap_or_default(),
                score,
                analysis: string_field(entry, "analysis")
                    .unwrap_or_else(|| default_analysis(score)),
                match_level: string_field(entry, "match_level")
                    .unwrap_or_else(|| match_level_for(score).to_string()),
                key_strengths: parse_key_strengths(entry),
            }
        })
        .collect();

    Ok(ranking)
}

/// Ranking derived from the candidates map, best score first.
fn derive_ranking(candidates: &BTreeMap<String, CandidateSummary>) -> Vec<RankingEntry> {
    let mut ranking: Vec<RankingEntry> = candidates
        .iter()
        .map(|(candidate_id, c)| RankingEntry {
            candidate_id: candidate_id.clone(),
            name: c.name.clone(),
            score: c.score,
            analysis: default_analysis(c.score),
            match_level: match_level_for(c.score).to_string(),
            key_strengths: Vec::new(),
        })
        .collect();
    ranking.sort_by(|a, b| b.score.cmp(&a.score));
    ranking
}

fn default_analysis(score: i64) -> String {
    format!("Candidato evaluado con un puntaje de {score} sobre 100.")
}

/// Normalize the summary. A section already carrying the canonical
/// `{kpis: {completed_interviews, avg_score}, notes}` shape is kept
/// verbatim, extra keys included; otherwise one is synthesized from the
/// candidates map.
fn normalize_summary(
    raw: Option<Value>,
    candidates: &BTreeMap<String, CandidateSummary>,
) -> Value {
    if let Some(value) = raw
        && is_canonical_summary(&value)
    {
        return value;
    }

    let completed = candidates.len();
    let avg_score = if completed == 0 {
        0.0
    } else {
        let total: i64 = candidates.values().map(|c| c.score).sum();
        let mean = total as f64 / completed as f64;
        (mean * 10.0).round() / 10.0
    };

    serde_json::json!({
        "kpis": {
            "completed_interviews": completed,
            "avg_score": avg_score,
        },
        "notes": format!("Resumen generado automáticamente para {completed} candidato(s)."),
    })
}

fn is_canonical_summary(value: &Value) -> bool {
    value
        .get("kpis")
        .is_some_and(|k| k.get("completed_interviews").is_some() && k.get("avg_score").is_some())
        && value.get("notes").is_some()
}

// ── Entry point ─────────────────────────────────────────────────────

/// Normalize the three raw sections into the canonical persisted shape.
///
/// `candidates_count` defaults to the size of the candidates map when not
/// supplied explicitly.
pub fn normalize(
    raw_summary: Option<RawSection>,
    raw_candidates: Option<RawSection>,
    raw_ranking: Option<RawSection>,
    candidates_count: Option<i64>,
) -> Result<NormalizedEvaluation, EvaluationError> {
    let summary_value = raw_summary.map(|s| s.into_value("summary")).transpose()?;
    let candidates_value = raw_candidates
        .map(|s| s.into_value("candidates"))
        .transpose()?;
    let ranking_value = raw_ranking.map(|s| s.into_value("ranking")).transpose()?;

    let candidates = normalize_candidates(candidates_value)?;
    let ranking = normalize_ranking(ranking_value, &candidates)?;
    let summary = normalize_summary(summary_value, &candidates);
    let candidates_count = candidates_count.unwrap_or(candidates.len() as i64);

    Ok(NormalizedEvaluation {
        summary,
        candidates,
        ranking,
        candidates_count,
    })
}
