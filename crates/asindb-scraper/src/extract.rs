//! Extraction of manufacturer and responsible-party contacts from the
//! disclosure side-sheet HTML fragment.
//!
//! Each section lives in its own container. A container whose text says
//! "not available" yields the sentinel record; otherwise every contact
//! sub-block becomes one [`ContactRecord`], in document order. A missing
//! container yields an empty sequence.

use asindb_core::{Asin, ContactRecord, DisclosureResult};
use scraper::{ElementRef, Html, Selector};

use crate::classify::{classify, FieldKind};
use crate::error::ScraperError;
use crate::selectors::{
    CONTACT_BLOCK, LINE_LIST, MANUFACTURER_CONTAINER, MANUFACTURER_NAME, RESPONSIBLE_CONTAINER,
    RESPONSIBLE_NAME,
};

const NOT_AVAILABLE_MARKER: &str = "not available";

/// The two disclosure sections. They differ only in where the party name
/// is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Manufacturer,
    Responsible,
}

impl Section {
    fn label(self) -> &'static str {
        match self {
            Section::Manufacturer => "manufacturer",
            Section::Responsible => "responsible",
        }
    }

    fn container(self) -> &'static Selector {
        match self {
            Section::Manufacturer => &MANUFACTURER_CONTAINER,
            Section::Responsible => &RESPONSIBLE_CONTAINER,
        }
    }

    fn name(self) -> &'static Selector {
        match self {
            Section::Manufacturer => &MANUFACTURER_NAME,
            Section::Responsible => &RESPONSIBLE_NAME,
        }
    }
}

/// Parses a disclosure fragment into a [`DisclosureResult`].
///
/// Pure over its inputs: the same markup always yields the same result.
///
/// # Errors
///
/// Returns [`ScraperError::UnrecognizedMarkup`] if the body contains no HTML
/// element at all (empty body or plain text) or is a JSON document, even
/// one carrying markup inside a string value.
pub fn extract_disclosure(asin: &Asin, html: &str) -> Result<DisclosureResult, ScraperError> {
    if is_json_document(html) {
        return Err(ScraperError::UnrecognizedMarkup {
            asin: asin.to_string(),
            reason: "response body is a JSON document".to_string(),
        });
    }

    let fragment = Html::parse_fragment(html);

    let has_elements = fragment
        .root_element()
        .descendants()
        .skip(1)
        .any(|node| node.value().is_element());
    if !has_elements {
        return Err(ScraperError::UnrecognizedMarkup {
            asin: asin.to_string(),
            reason: if html.trim().is_empty() {
                "empty response body".to_string()
            } else {
                "response body contains no HTML elements".to_string()
            },
        });
    }

    let manufacturer = extract_section(&fragment, Section::Manufacturer, asin);
    let responsible = extract_section(&fragment, Section::Responsible, asin);

    Ok(DisclosureResult::new(asin.clone(), manufacturer, responsible))
}

fn is_json_document(body: &str) -> bool {
    let trimmed = body.trim_start();
    (trimmed.starts_with('{') || trimmed.starts_with('['))
        && serde_json::from_str::<serde_json::Value>(trimmed).is_ok()
}

fn extract_section(fragment: &Html, section: Section, asin: &Asin) -> Vec<ContactRecord> {
    let Some(container) = fragment.select(section.container()).next() else {
        tracing::debug!(asin = %asin, section = section.label(), "section container absent");
        return Vec::new();
    };

    let container_text: String = container.text().collect();
    if container_text.to_lowercase().contains(NOT_AVAILABLE_MARKER) {
        return vec![ContactRecord::not_available()];
    }

    let records: Vec<ContactRecord> = container
        .select(&CONTACT_BLOCK)
        .map(|block| extract_contact(block, section))
        .collect();

    if records.is_empty() {
        tracing::debug!(
            asin = %asin,
            section = section.label(),
            "section container has no contact blocks"
        );
    }

    records
}

fn extract_contact(block: ElementRef<'_>, section: Section) -> ContactRecord {
    let name = block
        .select(section.name())
        .next()
        .map(element_text)
        .unwrap_or_default();

    let lines = block
        .select(&LINE_LIST)
        .flat_map(|list| list.children().filter_map(ElementRef::wrap))
        .map(element_text);

    build_contact(name, lines)
}

/// Routes each line into `email`, `phone`, or the address accumulator.
///
/// The first email and first phone win; any further email or phone line is
/// kept as address text rather than dropped. Blank lines are skipped.
fn build_contact(name: String, lines: impl Iterator<Item = String>) -> ContactRecord {
    let mut address: Vec<String> = Vec::new();
    let mut phone: Option<String> = None;
    let mut email: Option<String> = None;

    for line in lines {
        if line.is_empty() {
            continue;
        }
        match classify(&line) {
            FieldKind::Email if email.is_none() => email = Some(line),
            FieldKind::Phone if phone.is_none() => phone = Some(line),
            _ => address.push(line),
        }
    }

    ContactRecord {
        name,
        address: address.join(", "),
        phone,
        email,
    }
}

/// Concatenated text of an element with whitespace runs collapsed.
fn element_text(element: ElementRef<'_>) -> String {
    let raw: String = element.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
