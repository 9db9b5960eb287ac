//! Subject-line classifier for inbound messages.
//!
//! Two patterns are recognized; everything else is ignored:
//! - `<anything>-JD` (case-insensitive suffix) → a job request. The token
//!   right before the suffix doubles as a technology hint.
//! - `Status-<uuid>` (canonical 8-4-4-4-12 form) → a status query for the
//!   captured interview id.

use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

use crate::intake::types::MessageKind;

static JOB_REQUEST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(.*)-jd$").unwrap());

static STATUS_QUERY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^Status-([0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12})$",
    )
    .unwrap()
});

/// Classify a message subject.
pub fn classify(subject: &str) -> MessageKind {
    let subject = subject.trim();

    if let Some(caps) = STATUS_QUERY_RE.captures(subject) {
        // The regex guarantees canonical shape, so the parse cannot fail;
        // fall through to Ignored anyway rather than panicking.
        if let Ok(interview_id) = Uuid::parse_str(&caps[1]) {
            return MessageKind::StatusQuery { interview_id };
        }
        return MessageKind::Ignored;
    }

    if let Some(caps) = JOB_REQUEST_RE.captures(subject) {
        let prefix = caps[1].trim();
        let tech_hint = prefix
            .split_whitespace()
            .last()
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        return MessageKind::JobRequest { tech_hint };
    }

    MessageKind::Ignored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jd_suffix_is_a_job_request() {
        let kind = classify("ReactJS-JD");
        match kind {
            MessageKind::JobRequest { tech_hint } => {
                assert_eq!(tech_hint.as_deref(), Some("ReactJS"));
            }
            other => panic!("Expected JobRequest, got {:?}", other),
        }
    }

    #[test]
    fn jd_suffix_is_case_insensitive() {
        assert!(matches!(
            classify("python-jd"),
            MessageKind::JobRequest { .. }
        ));
        assert!(matches!(
            classify("Busco Backend-Jd"),
            MessageKind::JobRequest { .. }
        ));
    }

    #[test]
    fn jd_hint_is_last_token_before_suffix() {
        match classify("Necesito un perfil NodeJS-JD") {
            MessageKind::JobRequest { tech_hint } => {
                assert_eq!(tech_hint.as_deref(), Some("NodeJS"));
            }
            other => panic!("Expected JobRequest, got {:?}", other),
        }
    }

    #[test]
    fn status_with_valid_uuid() {
        let kind = classify("Status-123e4567-e89b-12d3-a456-426614174000");
        match kind {
            MessageKind::StatusQuery { interview_id } => {
                assert_eq!(
                    interview_id,
                    Uuid::parse_str("123e4567-e89b-12d3-a456-426614174000").unwrap()
                );
            }
            other => panic!("Expected StatusQuery, got {:?}", other),
        }
    }

    #[test]
    fn status_with_garbage_uuid_is_ignored() {
        assert_eq!(classify("Status-not-a-uuid"), MessageKind::Ignored);
        assert_eq!(classify("Status-123e4567"), MessageKind::Ignored);
    }

    #[test]
    fn status_must_match_exactly() {
        // Trailing text breaks the exact-match requirement
        assert_eq!(
            classify("Status-123e4567-e89b-12d3-a456-426614174000 por favor"),
            MessageKind::Ignored
        );
        // Lowercase prefix is not the protocol token
        assert_eq!(
            classify("status-123e4567-e89b-12d3-a456-426614174000"),
            MessageKind::Ignored
        );
    }

    #[test]
    fn plain_subjects_are_ignored() {
        assert_eq!(classify("Python Developer"), MessageKind::Ignored);
        assert_eq!(classify(""), MessageKind::Ignored);
        assert_eq!(classify("Re: consulta"), MessageKind::Ignored);
    }

    #[test]
    fn jd_in_the_middle_is_not_a_request() {
        assert_eq!(classify("JD-React position"), MessageKind::Ignored);
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        assert!(matches!(
            classify("  ReactJS-JD  "),
            MessageKind::JobRequest { .. }
        ));
    }
}
