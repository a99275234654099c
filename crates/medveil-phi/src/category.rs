//! PHI category names.
//!
//! Categories are open-ended strings, not a closed enum, because known-PII
//! keys arrive from upstream callers (contact lookups, intake forms). They
//! are normalized to uppercase and validated so that every minted token
//! `[CATEGORY_N]` stays parseable: the category of a token is the text
//! between `[` and the first `_`, so `_`, `[`, `]` and whitespace are
//! rejected inside names.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CategoryError {
    #[error("category name is empty")]
    Empty,
    #[error("category name contains invalid character {0:?}")]
    InvalidChar(char),
}

/// Validated, uppercase PHI category name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhiCategory(String);

impl PhiCategory {
    /// Normalize and validate a caller-supplied category name.
    pub fn new(name: &str) -> Result<Self, CategoryError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(CategoryError::Empty);
        }
        if let Some(bad) = trimmed
            .chars()
            .find(|c| matches!(c, '_' | '[' | ']') || c.is_whitespace())
        {
            return Err(CategoryError::InvalidChar(bad));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    // Built-in categories covered by the pattern catalog.
    pub fn phone() -> Self { Self("PHONE".to_string()) }
    pub fn email() -> Self { Self("EMAIL".to_string()) }
    pub fn ssn()   -> Self { Self("SSN".to_string()) }
    pub fn dob()   -> Self { Self("DOB".to_string()) }
    /// Prescription numbers. Deliberately `RX`, not `RX_NUMBER`: an
    /// underscore inside a category name would make its tokens unparseable
    /// for partial restore.
    pub fn rx()    -> Self { Self("RX".to_string()) }
    pub fn name()  -> Self { Self("NAME".to_string()) }

    /// Other known-PII fields commonly supplied by contact lookups.
    pub fn address() -> Self { Self("ADDRESS".to_string()) }
}

impl std::fmt::Display for PhiCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PhiCategory {
    type Error = CategoryError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<PhiCategory> for String {
    fn from(value: PhiCategory) -> Self {
        value.0
    }
}
