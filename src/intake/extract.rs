//! Field extraction from free-form message text.
//!
//! Each field runs through an ordered list of independent strategies; the
//! first one that produces an acceptable value wins. A field that no
//! strategy matches is `None` — values are never guessed.
//!
//! Strategy order:
//! 1. Dash-delimited form (`Cliente: Acme Corp - ...`), value sanitized to
//!    word characters, whitespace, hyphen, period.
//! 2. Line-delimited form (`Cliente: Acme Corp` to end of line), tried for
//!    every label spelling variant.
//! 3. Phone only — a generic phone-shaped scan over the whole text.

use std::sync::LazyLock;

use regex::Regex;

/// Label variants for the client (company) name.
pub const CLIENT_LABELS: &[&str] = &["Cliente", "Client", "Empresa"];

/// Label variants for the responsible contact person.
pub const RESPONSIBLE_LABELS: &[&str] = &["Responsable", "Responsible", "Contacto"];

/// Label variants for the phone number.
pub const PHONE_LABELS: &[&str] = &["Teléfono", "Telefono", "Tel", "Phone", "Celular"];

/// Minimum digits for a value to count as a phone number.
const MIN_PHONE_DIGITS: usize = 7;

/// Minimum sanitized length for a name-like value.
const MIN_VALUE_LEN: usize = 3;

static SANITIZE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s.\-]").unwrap());

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[+]?\(?\d{1,4}\)?(?:[-.\s]?\d{1,4}){1,4}").unwrap());

static ANGLE_EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([^<>\s]+@[^<>\s]+)>").unwrap());

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}").unwrap());

/// Ordered technology vocabulary — first substring hit wins. Spellings with
/// a shared prefix go before their prefix (TypeScript/JavaScript before
/// Java) so the longer name is preferred.
const TECHNOLOGIES: &[&str] = &[
    "React",
    "Angular",
    "Vue",
    "Node",
    "TypeScript",
    "JavaScript",
    "Python",
    "Django",
    "Kotlin",
    "Java",
    "Swift",
    "Flutter",
    ".NET",
    "C#",
    "PHP",
    "Laravel",
    "Ruby",
    "Rust",
    "Golang",
    "SQL",
    "AWS",
    "Azure",
    "DevOps",
    "QA",
    "Salesforce",
    "SAP",
];

/// Position-type vocabulary: (needle, canonical label). First hit wins;
/// "Desarrollador" is the fallback.
const POSITION_TYPES: &[(&str, &str)] = &[
    ("fullstack", "Fullstack"),
    ("full-stack", "Fullstack"),
    ("full stack", "Fullstack"),
    ("frontend", "Frontend"),
    ("front-end", "Frontend"),
    ("backend", "Backend"),
    ("back-end", "Backend"),
    ("mobile", "Mobile"),
    ("móvil", "Mobile"),
    ("devops", "DevOps"),
    ("tester", "QA"),
    ("qa", "QA"),
    ("arquitecto", "Arquitecto"),
    ("architect", "Arquitecto"),
    ("data", "Data"),
    ("datos", "Data"),
];

pub const DEFAULT_POSITION_TYPE: &str = "Desarrollador";

/// Strip everything except word characters, whitespace, hyphen, period.
fn sanitize(value: &str) -> String {
    SANITIZE_RE.replace_all(value, "").trim().to_string()
}

fn digit_count(s: &str) -> usize {
    s.chars().filter(|c| c.is_ascii_digit()).count()
}

/// Strategy 1 — dash-delimited form: `Label: value - ...`.
fn dash_delimited(label: &str, text: &str) -> Option<String> {
    let pattern = format!(r"(?i){}\s*:\s*([^-]+?)\s*-", regex::escape(label));
    let re = Regex::new(&pattern).ok()?;
    let caps = re.captures(text)?;
    let value = sanitize(&caps[1]);
    (value.len() >= MIN_VALUE_LEN).then_some(value)
}

/// Strategy 2 — line-delimited form: `Label[:=-] value` to end of line.
fn line_delimited(label: &str, text: &str) -> Option<String> {
    let pattern = format!(r"(?i){}\s*[:=\-]?\s*([^\n\r]+)", regex::escape(label));
    let re = Regex::new(&pattern).ok()?;
    let caps = re.captures(text)?;
    let value = sanitize(&caps[1]);
    (value.len() >= MIN_VALUE_LEN).then_some(value)
}

/// Extract a labeled field. Strategies run in priority order; the first
/// acceptable value wins. Returns `None` rather than ever guessing.
pub fn extract_field(label: &str, text: &str) -> Option<String> {
    dash_delimited(label, text).or_else(|| line_delimited(label, text))
}

/// Extract a labeled field trying several label spelling variants.
pub fn extract_field_any(labels: &[&str], text: &str) -> Option<String> {
    labels
        .iter()
        .find_map(|label| dash_delimited(label, text))
        .or_else(|| labels.iter().find_map(|label| line_delimited(label, text)))
}

/// Extract a phone number: labeled strategies first, then a phone-shaped
/// scan over the whole text as a last resort. Accepted only with at least
/// seven digits.
pub fn extract_phone(text: &str) -> Option<String> {
    if let Some(value) = extract_field_any(PHONE_LABELS, text)
        && digit_count(&value) >= MIN_PHONE_DIGITS
    {
        return Some(value);
    }

    PHONE_RE
        .find_iter(text)
        .map(|m| m.as_str().trim().to_string())
        .find(|candidate| digit_count(candidate) >= MIN_PHONE_DIGITS)
}

/// First technology from the vocabulary found in `text`, or `None`.
pub fn extract_technology(text: &str) -> Option<String> {
    let haystack = text.to_lowercase();
    TECHNOLOGIES
        .iter()
        .find(|tech| haystack.contains(&tech.to_lowercase()))
        .map(|tech| tech.to_string())
}

/// Position type from the vocabulary, defaulting to "Desarrollador".
pub fn extract_position_type(text: &str) -> String {
    let haystack = text.to_lowercase();
    POSITION_TYPES
        .iter()
        .find(|(needle, _)| haystack.contains(needle))
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or_else(|| DEFAULT_POSITION_TYPE.to_string())
}

/// Pull a bare email address out of a raw sender field.
///
/// Prefers the `<...>` capture of a `Display Name <email>` form. A bare
/// email-shaped token is accepted only when it spans the whole input or the
/// input has no embedded space — this guards against extracting a fragment
/// of a display name that happens to contain an `@`.
pub fn clean_email(raw: &str) -> Option<String> {
    let trimmed = raw.trim();

    if let Some(caps) = ANGLE_EMAIL_RE.captures(trimmed) {
        return Some(caps[1].to_lowercase());
    }

    let m = EMAIL_RE.find(trimmed)?;
    let spans_whole = m.start() == 0 && m.end() == trimmed.len();
    if spans_whole || !trimmed.contains(' ') {
        return Some(m.as_str().to_lowercase());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Labeled field extraction ────────────────────────────────────

    #[test]
    fn dash_form_wins() {
        let text = "Cliente: Acme Corp - Responsable: Juan -";
        assert_eq!(extract_field("Cliente", text).as_deref(), Some("Acme Corp"));
        assert_eq!(extract_field("Responsable", text).as_deref(), Some("Juan"));
    }

    #[test]
    fn dash_form_sanitizes_value() {
        let text = "Cliente: Acme® Corp! - fin";
        assert_eq!(extract_field("Cliente", text).as_deref(), Some("Acme Corp"));
    }

    #[test]
    fn line_form_as_fallback() {
        let text = "Empresa que busca\nCliente: Acme Corporation\nSaludos";
        assert_eq!(
            extract_field("Cliente", text).as_deref(),
            Some("Acme Corporation")
        );
    }

    #[test]
    fn label_match_is_case_insensitive() {
        let text = "CLIENTE: Acme Corp - fin";
        assert_eq!(extract_field("Cliente", text).as_deref(), Some("Acme Corp"));
    }

    #[test]
    fn missing_label_returns_none() {
        assert_eq!(extract_field("Cliente", "sin datos útiles"), None);
    }

    #[test]
    fn too_short_value_is_rejected() {
        // Sanitized length must exceed two characters
        assert_eq!(extract_field("Cliente", "Cliente: Ab"), None);
    }

    #[test]
    fn label_variants_are_tried_in_order() {
        let text = "Empresa: Globant\nmás texto";
        assert_eq!(
            extract_field_any(CLIENT_LABELS, text).as_deref(),
            Some("Globant")
        );
    }

    // ── Phone extraction ────────────────────────────────────────────

    #[test]
    fn labeled_phone_wins() {
        let text = "Teléfono: +54 11 4444-5555\notro";
        let phone = extract_phone(text).unwrap();
        assert!(phone.contains("4444"));
    }

    #[test]
    fn phone_shape_fallback_over_whole_text() {
        let text = "llamar al +1 (555) 123-4567 por la tarde";
        let phone = extract_phone(text).unwrap();
        assert!(digit_count(&phone) >= 7);
    }

    #[test]
    fn short_numbers_are_not_phones() {
        assert_eq!(extract_phone("sala 1234"), None);
    }

    #[test]
    fn no_digits_no_phone() {
        assert_eq!(extract_phone("sin números aquí"), None);
    }

    // ── Vocabulary scans ────────────────────────────────────────────

    #[test]
    fn first_technology_hit_wins() {
        assert_eq!(
            extract_technology("buscamos React y Node").as_deref(),
            Some("React")
        );
    }

    #[test]
    fn technology_match_is_case_insensitive() {
        assert_eq!(extract_technology("perfil PYTHON senior").as_deref(), Some("Python"));
    }

    #[test]
    fn technology_within_compound_token() {
        assert_eq!(extract_technology("ReactJS").as_deref(), Some("React"));
    }

    #[test]
    fn unknown_technology_is_none() {
        assert_eq!(extract_technology("perfil administrativo"), None);
    }

    #[test]
    fn position_type_with_default() {
        assert_eq!(extract_position_type("desarrollador backend ssr"), "Backend");
        assert_eq!(extract_position_type("perfil full stack"), "Fullstack");
        assert_eq!(extract_position_type("nada que ver"), "Desarrollador");
    }

    // ── Email cleaning ──────────────────────────────────────────────

    #[test]
    fn angle_form_is_preferred() {
        assert_eq!(
            clean_email("Juan Pérez <juan@acme.com>").as_deref(),
            Some("juan@acme.com")
        );
    }

    #[test]
    fn bare_email_spanning_whole_input() {
        assert_eq!(clean_email("ana@corp.com").as_deref(), Some("ana@corp.com"));
        assert_eq!(clean_email("  ANA@Corp.com  ").as_deref(), Some("ana@corp.com"));
    }

    #[test]
    fn embedded_email_without_spaces_is_accepted() {
        assert_eq!(
            clean_email("mailto:ana@corp.com").as_deref(),
            Some("ana@corp.com")
        );
    }

    #[test]
    fn display_name_fragment_is_rejected() {
        // A display name containing an @ must not yield a fragment
        assert_eq!(clean_email("ana@corp.com escribió esto"), None);
    }

    #[test]
    fn no_email_shape_returns_none() {
        assert_eq!(clean_email("Juan Pérez"), None);
    }
}
