//! Disclosure data model: identifiers, contact records, and per-ASIN results.
//!
//! A [`DisclosureResult`] is built once per scraped ASIN and never mutated
//! afterwards. Both party sequences keep document order.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Literal used by the sentinel [`ContactRecord`] when the remote source
/// marks a section as unavailable.
pub const NOT_AVAILABLE: &str = "Not available";

/// An Amazon Standard Identification Number, treated as an opaque key.
///
/// Construction trims surrounding whitespace and requires a non-empty ASCII
/// alphanumeric string. No checksum or length validation is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Asin(String);

impl Asin {
    /// Parses a raw identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidAsin`] if the trimmed value is empty or
    /// contains anything other than ASCII letters and digits.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidAsin {
                asin: raw.to_string(),
                reason: "empty identifier".into(),
            });
        }
        if !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CoreError::InvalidAsin {
                asin: raw.to_string(),
                reason: "identifier must be ASCII alphanumeric".into(),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Asin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Asin {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalizes raw identifiers into [`Asin`]s, keeping input order and
/// duplicates.
///
/// Returns the accepted identifiers and the rejected inputs with the reason
/// each was rejected.
#[must_use]
pub fn normalize_asins<I, S>(raw: I) -> (Vec<Asin>, Vec<CoreError>)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();
    for value in raw {
        match Asin::parse(value.as_ref()) {
            Ok(asin) => accepted.push(asin),
            Err(e) => rejected.push(e),
        }
    }
    (accepted, rejected)
}

/// A manufacturer or responsible-party contact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    /// Party name; empty when the markup carries no name label.
    pub name: String,
    /// Free-text address lines joined with `", "`; may be empty.
    pub address: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl ContactRecord {
    /// The sentinel record emitted when a section is explicitly marked
    /// "not available" by the source.
    #[must_use]
    pub fn not_available() -> Self {
        Self {
            name: NOT_AVAILABLE.to_string(),
            address: NOT_AVAILABLE.to_string(),
            phone: Some(NOT_AVAILABLE.to_string()),
            email: Some(NOT_AVAILABLE.to_string()),
        }
    }

    /// Returns `true` if every field holds the sentinel literal.
    #[must_use]
    pub fn is_not_available(&self) -> bool {
        self.name == NOT_AVAILABLE
            && self.address == NOT_AVAILABLE
            && self.phone.as_deref() == Some(NOT_AVAILABLE)
            && self.email.as_deref() == Some(NOT_AVAILABLE)
    }

    /// Returns `true` if no field carries any data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
            && self.address.is_empty()
            && self.phone.is_none()
            && self.email.is_none()
    }
}

/// Why extraction for one ASIN produced no data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Network error, timeout, or non-2xx status from the remote endpoint.
    Fetch,
    /// The response body was not recognizable markup.
    Parse,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Fetch => write!(f, "fetch"),
            FailureKind::Parse => write!(f, "parse"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionFailure {
    pub kind: FailureKind,
    pub message: String,
}

/// Disclosure data for a single ASIN.
///
/// A failed extraction is still represented: both sequences are empty and
/// `failure` says why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisclosureResult {
    pub asin: Asin,
    pub manufacturer: Vec<ContactRecord>,
    pub responsible: Vec<ContactRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<ExtractionFailure>,
}

impl DisclosureResult {
    #[must_use]
    pub fn new(
        asin: Asin,
        manufacturer: Vec<ContactRecord>,
        responsible: Vec<ContactRecord>,
    ) -> Self {
        Self {
            asin,
            manufacturer,
            responsible,
            failure: None,
        }
    }

    /// Builds the empty-but-valid result recorded for a failed ASIN.
    #[must_use]
    pub fn failed(asin: Asin, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            asin,
            manufacturer: Vec::new(),
            responsible: Vec::new(),
            failure: Some(ExtractionFailure {
                kind,
                message: message.into(),
            }),
        }
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// Number of export rows this result occupies (at least one).
    #[must_use]
    pub fn row_span(&self) -> usize {
        self.manufacturer.len().max(self.responsible.len()).max(1)
    }
}

#[cfg(test)]
#[path = "disclosure_test.rs"]
mod tests;
