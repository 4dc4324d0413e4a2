//! Flattening of [`DisclosureResult`]s into one-contact-per-row export rows.
//!
//! A result with several manufacturers or responsible parties spans several
//! rows; the ASIN appears only on the first of them and the span is reported
//! so a renderer can merge the identifier cells.

use crate::disclosure::{ContactRecord, DisclosureResult};

pub const EXPORT_HEADINGS: [&str; 9] = [
    "ASIN",
    "Manufacturer Name",
    "Manufacturer Address",
    "Manufacturer Phone",
    "Manufacturer Email",
    "Responsible Name",
    "Responsible Address",
    "Responsible Phone",
    "Responsible Email",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportRow {
    /// Empty on continuation rows of a multi-party result.
    pub asin: String,
    pub manufacturer: ContactRecord,
    pub responsible: ContactRecord,
}

impl ExportRow {
    /// Cell values in [`EXPORT_HEADINGS`] order.
    #[must_use]
    pub fn cells(&self) -> [&str; 9] {
        [
            self.asin.as_str(),
            self.manufacturer.name.as_str(),
            self.manufacturer.address.as_str(),
            self.manufacturer.phone.as_deref().unwrap_or(""),
            self.manufacturer.email.as_deref().unwrap_or(""),
            self.responsible.name.as_str(),
            self.responsible.address.as_str(),
            self.responsible.phone.as_deref().unwrap_or(""),
            self.responsible.email.as_deref().unwrap_or(""),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSheet {
    pub rows: Vec<ExportRow>,
    /// Inclusive `(first, last)` zero-based row indices of results that span
    /// more than one row.
    pub merge_spans: Vec<(usize, usize)>,
}

/// Flattens results into export rows in input order.
#[must_use]
pub fn flatten_results(results: &[DisclosureResult]) -> ExportSheet {
    let mut sheet = ExportSheet::default();

    for result in results {
        let span = result.row_span();
        let first = sheet.rows.len();

        for i in 0..span {
            sheet.rows.push(ExportRow {
                asin: if i == 0 {
                    result.asin.to_string()
                } else {
                    String::new()
                },
                manufacturer: result.manufacturer.get(i).cloned().unwrap_or_default(),
                responsible: result.responsible.get(i).cloned().unwrap_or_default(),
            });
        }

        if span > 1 {
            sheet.merge_spans.push((first, first + span - 1));
        }
    }

    sheet
}

#[cfg(test)]
#[path = "export_test.rs"]
mod tests;
