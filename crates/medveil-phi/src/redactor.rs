//! Tokenizing redaction.
//!
//! Three passes in fixed order, so output is deterministic and earlier
//! passes always win overlapping claims:
//!
//! 1. caller-supplied known values (verbatim),
//! 2. the pattern catalog (phone, email, SSN, DOB, RX),
//! 3. the honorific name heuristic.
//!
//! Every distinct value gets one token, `[CATEGORY_N]`, with a 1-based
//! per-category counter shared across passes; every literal occurrence of
//! that value is replaced with the same token. Minted tokens contain only
//! uppercase letters, digits, `_` and brackets, so no catalog pattern can
//! match inside an already-replaced span.

use std::collections::HashMap;

use chrono::Utc;

use crate::category::PhiCategory;
use crate::models::{RedactionResult, TokenMap};
use crate::patterns;

/// Redact with no caller hints. See [`redact_with_known`].
pub fn redact(text: &str) -> RedactionResult {
    redact_with_known(text, &[])
}

/// Strip PHI from `text`, returning the cleaned text plus the token map
/// needed to reverse it.
///
/// `known` pairs are matched byte-exactly and claim their text before any
/// pattern runs; their order determines sequence numbers, so callers should
/// pass a stable order (see `PatientProfile::known_values`).
///
/// Empty input and PHI-free input are not errors: the text comes back
/// unchanged with an empty map.
pub fn redact_with_known(text: &str, known: &[(PhiCategory, String)]) -> RedactionResult {
    let mut minter = Minter::default();
    let mut clean = text.to_string();

    // Pass 1: known values.
    for (category, value) in known {
        if value.is_empty() {
            continue;
        }
        minter.claim(&mut clean, category, value);
    }

    // Pass 2: pattern catalog. Matches are collected up front and then
    // claimed one value at a time; a value swallowed by an earlier
    // replacement no longer occurs and is skipped, so the map never holds
    // a token that is absent from the text.
    for pattern in patterns::catalog() {
        let matches: Vec<String> = pattern
            .regex
            .find_iter(&clean)
            .map(|m| m.as_str().to_string())
            .collect();
        for value in matches {
            minter.claim(&mut clean, &pattern.category, &value);
        }
    }

    // Pass 3: name heuristic.
    let name_category = PhiCategory::name();
    let names: Vec<String> = patterns::name_regex()
        .find_iter(&clean)
        .map(|m| m.as_str().to_string())
        .collect();
    for value in names {
        minter.claim(&mut clean, &name_category, &value);
    }

    let result = RedactionResult {
        text: clean,
        token_map: minter.map,
        created_at: Utc::now(),
    };
    tracing::debug!(
        tokens = result.token_count(),
        categories = ?result.categories(),
        "redaction complete"
    );
    result
}

/// Cheap pre-filter: `false` guarantees a full `redact` (with no known
/// values) also finds nothing, so callers may skip it. Never a false
/// negative; false positives are fine.
pub fn quick_check(text: &str) -> bool {
    patterns::any_match(text)
}

/// Per-call token minting state: one counter per category, plus the map.
#[derive(Default)]
struct Minter {
    counters: HashMap<String, u32>,
    map: TokenMap,
}

impl Minter {
    /// Mint a token for `value` and replace every literal occurrence of it
    /// in `text`. No-op if the value no longer occurs (already claimed by an
    /// earlier pass or an earlier value).
    fn claim(&mut self, text: &mut String, category: &PhiCategory, value: &str) {
        if !text.contains(value) {
            return;
        }
        let n = self.counters.entry(category.as_str().to_string()).or_insert(0);
        *n += 1;
        let token = format!("[{}_{}]", category.as_str(), n);
        *text = replace_all_literal(text.as_str(), value, &token);
        self.map.insert(token, value.to_string());
    }
}

/// Replace every occurrence of `needle` in one linear scan, copying the
/// spans between matches. Replaced output is never re-scanned.
fn replace_all_literal(haystack: &str, needle: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(haystack.len());
    let mut rest = haystack;
    while let Some(idx) = rest.find(needle) {
        out.push_str(&rest[..idx]);
        out.push_str(replacement);
        rest = &rest[idx + needle.len()..];
    }
    out.push_str(rest);
    out
}
