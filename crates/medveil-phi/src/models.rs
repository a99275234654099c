//! Data objects carried through the redact → reason → restore round trip.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};

use crate::category::PhiCategory;
use crate::restorer::token_category;

/// Placeholder token → original plaintext value, scoped to one redaction
/// call. Never merged across calls, never persisted, never logged verbatim.
pub type TokenMap = HashMap<String, String>;

/// Output of one redaction call. Immutable once produced; the cleaned `text`
/// is the only field that may cross the privacy boundary to the reasoning
/// backend.
#[derive(Debug, Clone)]
pub struct RedactionResult {
    pub text: String,
    pub token_map: TokenMap,
    pub created_at: DateTime<Utc>,
}

impl RedactionResult {
    /// Distinct categories touched by this call, sorted. Safe to log.
    pub fn categories(&self) -> BTreeSet<&str> {
        self.token_map
            .keys()
            .filter_map(|token| token_category(token))
            .collect()
    }

    pub fn token_count(&self) -> usize {
        self.token_map.len()
    }
}

/// Known patient identifiers from an upstream contact lookup.
///
/// Raw PHI — never send this anywhere; feed it to
/// [`redact_with_known`](crate::redact_with_known) so the values are
/// tokenized before any text leaves the process.
#[derive(Debug, Clone, Default)]
pub struct PatientProfile {
    pub name: Option<String>,
    pub dob: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub rx_number: Option<String>,
}

impl PatientProfile {
    /// Known-PII pairs in a fixed order, for deterministic token numbering.
    pub fn known_values(&self) -> Vec<(PhiCategory, String)> {
        let fields = [
            (PhiCategory::name(), &self.name),
            (PhiCategory::dob(), &self.dob),
            (PhiCategory::phone(), &self.phone),
            (PhiCategory::email(), &self.email),
            (PhiCategory::address(), &self.address),
            (PhiCategory::rx(), &self.rx_number),
        ];
        fields
            .into_iter()
            .filter_map(|(cat, value)| value.as_ref().map(|v| (cat, v.clone())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_values_skips_unset_fields() {
        let profile = PatientProfile {
            name: Some("John Smith".to_string()),
            phone: Some("555-123-4567".to_string()),
            ..Default::default()
        };
        let known = profile.known_values();
        assert_eq!(known.len(), 2);
        assert_eq!(known[0], (PhiCategory::name(), "John Smith".to_string()));
        assert_eq!(known[1], (PhiCategory::phone(), "555-123-4567".to_string()));
    }

    #[test]
    fn test_categories_are_sorted_and_distinct() {
        let mut map = TokenMap::new();
        map.insert("[PHONE_1]".to_string(), "555-123-4567".to_string());
        map.insert("[PHONE_2]".to_string(), "555-987-6543".to_string());
        map.insert("[NAME_1]".to_string(), "John Smith".to_string());
        let result = RedactionResult {
            text: String::new(),
            token_map: map,
            created_at: Utc::now(),
        };
        let cats: Vec<&str> = result.categories().into_iter().collect();
        assert_eq!(cats, vec!["NAME", "PHONE"]);
    }
}
