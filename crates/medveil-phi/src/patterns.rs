//! PHI pattern catalog.
//!
//! Fixed matching rules for the identifier kinds the engine recognizes
//! without caller hints. Catalog order is part of the redaction contract:
//! earlier patterns claim their matches before later ones run.

use std::sync::OnceLock;

use regex::Regex;

use crate::category::PhiCategory;

/// One entry in the catalog: a category and its compiled matcher.
pub struct PhiPattern {
    pub category: PhiCategory,
    pub regex: &'static Regex,
}

fn phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b").unwrap())
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap()
    })
}

fn ssn_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap())
}

fn dob_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\d{1,2}/\d{1,2}/\d{2,4}\b").unwrap())
}

fn rx_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bRX\d{6,}\b").unwrap())
}

/// Honorific followed by two capitalized words. A deliberate heuristic, not
/// NER: it catches the "Dr. Jane Doe" shape that dominates intake text.
pub fn name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?:Mr|Mrs|Ms|Dr)\.\s+[A-Z][a-z]+\s+[A-Z][a-z]+\b").unwrap()
    })
}

/// The catalog, in match-priority order.
pub fn catalog() -> Vec<PhiPattern> {
    vec![
        PhiPattern { category: PhiCategory::phone(), regex: phone_regex() },
        PhiPattern { category: PhiCategory::email(), regex: email_regex() },
        PhiPattern { category: PhiCategory::ssn(),   regex: ssn_regex() },
        PhiPattern { category: PhiCategory::dob(),   regex: dob_regex() },
        PhiPattern { category: PhiCategory::rx(),    regex: rx_regex() },
    ]
}

/// True if any catalog pattern or the name heuristic matches anywhere.
///
/// Guaranteed sound as a skip-check: a `false` here means a full redaction
/// with no known values finds nothing. The name heuristic is included for
/// exactly that reason.
pub fn any_match(text: &str) -> bool {
    catalog().iter().any(|p| p.regex.is_match(text)) || name_regex().is_match(text)
}
