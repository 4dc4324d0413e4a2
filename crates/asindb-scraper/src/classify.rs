//! Content-based classification of unlabeled contact lines.
//!
//! Email and phone are precise allow-lists; everything else is address.
//! Checks run in a fixed order (email, phone, address), so a line matching
//! several patterns resolves to the earliest one.

use std::sync::LazyLock;

use regex::Regex;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\+?[0-9]{1,3}[\s-]?)?(\(?[0-9]{2,4}\)?[\s-]?)?[0-9]{3,4}[\s-]?[0-9]{4}$")
        .expect("valid phone regex")
});

static STREET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)[0-9]+\s+([a-z]+\s?)+(street|st|road|rd|avenue|ave|boulevard|blvd|lane|ln|drive|dr|court|ct)\b",
    )
    .expect("valid street regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Email,
    Phone,
    Address,
}

/// Classifies one text line. Total: every input maps to a kind.
#[must_use]
pub fn classify(line: &str) -> FieldKind {
    let value = line.trim();

    if EMAIL_RE.is_match(value) {
        return FieldKind::Email;
    }
    if PHONE_RE.is_match(value) {
        return FieldKind::Phone;
    }
    // Street-shaped or not, the remaining lines are address text.
    FieldKind::Address
}

/// Returns `true` if the line looks like a street address
/// ("digits, words, street keyword").
///
/// Advisory only: [`classify`] already sends every non-email, non-phone
/// line to [`FieldKind::Address`].
#[must_use]
pub fn looks_like_street_address(line: &str) -> bool {
    STREET_RE.is_match(line.trim())
}
