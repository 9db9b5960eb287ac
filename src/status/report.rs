//! Plain-text rendering of a status overview.
//!
//! Formatting never crashes a section: a missing field renders as "N/A",
//! never omitted and never invented.

use crate::status::overview::{CandidateOverview, StatusOverview};

/// Tech stack entries shown before collapsing into an overflow count.
const TECH_STACK_SHOWN: usize = 5;

/// Strengths shown per candidate block.
const STRENGTHS_SHOWN: usize = 3;

/// Concerns shown per candidate block.
const CONCERNS_SHOWN: usize = 2;

/// Alerts shown per candidate block.
const ALERTS_SHOWN: usize = 3;

const NOT_AVAILABLE: &str = "N/A";

/// Subject line for the report email.
pub fn render_subject(overview: &StatusOverview) -> String {
    format!(
        "Estado de evaluaciones: {} ({} candidatos)",
        overview.interview.name, overview.candidates_count
    )
}

/// Render the full plain-text report body.
pub fn render_body(overview: &StatusOverview) -> String {
    let mut out = String::with_capacity(2048);

    // ── Header ──────────────────────────────────────────────────────
    out.push_str("ESTADO DEL PROCESO DE SELECCIÓN\n");
    out.push_str("===============================\n\n");
    out.push_str(&format!("Cliente: {}\n", non_empty(&overview.client.name)));
    out.push_str(&format!("Email: {}\n", non_empty(&overview.client.email)));
    out.push_str(&format!(
        "Responsable: {}\n",
        opt(&overview.client.responsible)
    ));
    out.push_str(&format!("Teléfono: {}\n\n", opt(&overview.client.phone)));
    out.push_str(&format!("Búsqueda: {}\n", non_empty(&overview.interview.name)));
    out.push_str(&format!("ID: {}\n", overview.interview.id));
    out.push_str(&format!(
        "Candidatos evaluados: {}\n\n",
        overview.candidates_count
    ));

    // ── KPIs ────────────────────────────────────────────────────────
    out.push_str("INDICADORES\n-----------\n");
    out.push_str(&format!("Puntaje promedio: {:.2}\n", overview.avg_score));
    out.push_str(&format!(
        "Entrevistas completadas: {}\n\n",
        overview.candidates_count
    ));

    // ── Candidate blocks ────────────────────────────────────────────
    out.push_str("CANDIDATOS\n----------\n");
    for candidate in &overview.candidates {
        render_candidate(&mut out, candidate);
    }

    // ── Ranking ─────────────────────────────────────────────────────
    out.push_str("RANKING\n-------\n");
    for slot in &overview.ranking {
        let marker = match slot.position {
            1 => "🥇".to_string(),
            2 => "🥈".to_string(),
            3 => "🥉".to_string(),
            n => format!("#{n}"),
        };
        out.push_str(&format!(
            "{} {} — {:.0} pts\n",
            marker,
            non_empty(&slot.name),
            slot.compatibility_score
        ));
    }

    out
}

fn render_candidate(out: &mut String, candidate: &CandidateOverview) {
    out.push_str(&format!(
        "\n{} — {:.0} pts {}\n",
        non_empty(&candidate.name),
        candidate.compatibility_score,
        recommendation_icon(&candidate.recommendation),
    ));
    out.push_str(&format!(
        "  Recomendación: {}\n",
        non_empty(&candidate.recommendation)
    ));
    out.push_str(&format!("  Stack: {}\n", render_tech_stack(&candidate.tech_stack)));
    out.push_str(&format!(
        "  Nivel de conocimiento: {}\n",
        opt(&candidate.knowledge_level)
    ));
    out.push_str(&format!(
        "  Experiencia práctica: {}\n",
        opt(&candidate.practical_experience)
    ));
    out.push_str(&format!("  Completitud: {:.1}%\n", candidate.completeness_pct()));

    if !candidate.strengths.is_empty() {
        let shown: Vec<&str> = candidate
            .strengths
            .iter()
            .take(STRENGTHS_SHOWN)
            .map(String::as_str)
            .collect();
        out.push_str(&format!("  Fortalezas: {}\n", shown.join("; ")));
    }
    if !candidate.concerns.is_empty() {
        let shown: Vec<&str> = candidate
            .concerns
            .iter()
            .take(CONCERNS_SHOWN)
            .map(String::as_str)
            .collect();
        out.push_str(&format!("  Áreas de atención: {}\n", shown.join("; ")));
    }

    out.push_str(&format!(
        "  CV: {}\n",
        candidate.cv_url.as_deref().unwrap_or("No disponible")
    ));

    for alert in candidate.alerts.iter().take(ALERTS_SHOWN) {
        out.push_str(&format!("  ⚠ {alert}\n"));
    }
}

fn render_tech_stack(stack: &[String]) -> String {
    if stack.is_empty() {
        return NOT_AVAILABLE.to_string();
    }
    let shown: Vec<&str> = stack.iter().take(TECH_STACK_SHOWN).map(String::as_str).collect();
    let mut rendered = shown.join(", ");
    if stack.len() > TECH_STACK_SHOWN {
        rendered.push_str(&format!(" (+{} más)", stack.len() - TECH_STACK_SHOWN));
    }
    rendered
}

fn recommendation_icon(recommendation: &str) -> &'static str {
    let lower = recommendation.to_lowercase();
    if lower.contains("no recomendado") {
        "❌"
    } else if lower.contains("recomendado") {
        "✅"
    } else {
        "⚠️"
    }
}

fn non_empty(s: &str) -> &str {
    let trimmed = s.trim();
    if trimmed.is_empty() { NOT_AVAILABLE } else { trimmed }
}

fn opt(s: &Option<String>) -> &str {
    s.as_deref().map(|v| non_empty(v)).unwrap_or(NOT_AVAILABLE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::status::overview::RankingSlot;
    use crate::store::{Client, Interview};

    fn candidate(name: &str, score: f64) -> CandidateOverview {
        CandidateOverview {
            candidate_id: name.to_lowercase(),
            name: name.into(),
            compatibility_score: score,
            recommendation: "Recomendado".into(),
            tech_stack: vec!["React".into(), "Node".into()],
            knowledge_level: Some("senior".into()),
            practical_experience: Some("5 años".into()),
            fully_answered: 9,
            total_questions: 10,
            strengths: vec!["APIs".into(), "SQL".into(), "Testing".into(), "Docker".into()],
            concerns: vec!["inglés".into(), "horarios".into(), "otro".into()],
            cv_url: Some("https://cv.example.com/a.pdf".into()),
            alerts: vec![],
        }
    }

    fn overview(candidates: Vec<CandidateOverview>) -> StatusOverview {
        let ranking = candidates
            .iter()
            .enumerate()
            .take(5)
            .map(|(i, c)| RankingSlot {
                position: i + 1,
                candidate_id: c.candidate_id.clone(),
                name: c.name.clone(),
                compatibility_score: c.compatibility_score,
            })
            .collect();
        let count = candidates.len();

        StatusOverview {
            interview: Interview {
                id: "iv-1".into(),
                name: "Backend Node".into(),
                description: String::new(),
                client_id: "cl-1".into(),
                voice_agent_id: None,
                created_at: Utc::now(),
            },
            client: Client {
                id: "cl-1".into(),
                email: "cliente@acme.com".into(),
                name: "Acme".into(),
                responsible: None,
                phone: None,
                created_at: Utc::now(),
            },
            candidates,
            ranking,
            candidates_count: count,
            avg_score: 77.25,
        }
    }

    #[test]
    fn subject_names_interview_and_count() {
        let ov = overview(vec![candidate("Ana", 90.0)]);
        let subject = render_subject(&ov);
        assert!(subject.contains("Backend Node"));
        assert!(subject.contains('1'));
    }

    #[test]
    fn body_contains_header_and_kpis() {
        let ov = overview(vec![candidate("Ana", 90.0)]);
        let body = render_body(&ov);
        assert!(body.contains("Cliente: Acme"));
        assert!(body.contains("Email: cliente@acme.com"));
        assert!(body.contains("Responsable: N/A"));
        assert!(body.contains("Puntaje promedio: 77.25"));
    }

    #[test]
    fn missing_fields_render_as_na_not_omitted() {
        let mut c = candidate("Ana", 90.0);
        c.knowledge_level = None;
        c.practical_experience = None;
        c.tech_stack = vec![];
        let body = render_body(&overview(vec![c]));

        assert!(body.contains("Nivel de conocimiento: N/A"));
        assert!(body.contains("Experiencia práctica: N/A"));
        assert!(body.contains("Stack: N/A"));
    }

    #[test]
    fn tech_stack_truncates_with_overflow_count() {
        let mut c = candidate("Ana", 90.0);
        c.tech_stack = (1..=8).map(|i| format!("T{i}")).collect();
        let body = render_body(&overview(vec![c]));

        assert!(body.contains("T1, T2, T3, T4, T5 (+3 más)"));
        assert!(!body.contains("T6"));
    }

    #[test]
    fn strengths_and_concerns_are_capped() {
        let body = render_body(&overview(vec![candidate("Ana", 90.0)]));
        assert!(body.contains("Fortalezas: APIs; SQL; Testing"));
        assert!(!body.contains("Docker"));
        assert!(body.contains("Áreas de atención: inglés; horarios"));
        assert!(!body.contains("otro"));
    }

    #[test]
    fn missing_cv_says_not_available() {
        let mut c = candidate("Ana", 90.0);
        c.cv_url = None;
        let body = render_body(&overview(vec![c]));
        assert!(body.contains("CV: No disponible"));
    }

    #[test]
    fn alerts_are_capped_at_three() {
        let mut c = candidate("Ana", 90.0);
        c.alerts = vec!["a1".into(), "a2".into(), "a3".into(), "a4".into()];
        let body = render_body(&overview(vec![c]));
        assert!(body.contains("⚠ a3"));
        assert!(!body.contains("a4"));
    }

    #[test]
    fn ranking_uses_medals_then_numbers() {
        let candidates = vec![
            candidate("Uno", 95.0),
            candidate("Dos", 90.0),
            candidate("Tres", 85.0),
            candidate("Cuatro", 80.0),
            candidate("Cinco", 75.0),
        ];
        let body = render_body(&overview(candidates));
        assert!(body.contains("🥇 Uno"));
        assert!(body.contains("🥈 Dos"));
        assert!(body.contains("🥉 Tres"));
        assert!(body.contains("#4 Cuatro"));
        assert!(body.contains("#5 Cinco"));
    }

    #[test]
    fn recommendation_icons() {
        assert_eq!(recommendation_icon("Recomendado"), "✅");
        assert_eq!(recommendation_icon("No recomendado"), "❌");
        assert_eq!(recommendation_icon("Condicional"), "⚠️");
    }

    #[test]
    fn completeness_renders_one_decimal() {
        let body = render_body(&overview(vec![candidate("Ana", 90.0)]));
        assert!(body.contains("Completitud: 90.0%"));
    }
}
