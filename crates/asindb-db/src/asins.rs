//! Database operations for the `asins` table.
//!
//! An ASIN is pending while either of its contact columns is `NULL`. A
//! stored scrape sets both columns (possibly to empty arrays) and clears
//! the `exported` flag so the next export picks the row up again.

use asindb_core::{Asin, ContactRecord, DisclosureResult};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `asins` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AsinRow {
    pub asin: String,
    /// JSON array of contact records, `NULL` until scraped.
    pub manufacturer: Option<serde_json::Value>,
    /// JSON array of contact records, `NULL` until scraped.
    pub responsible: Option<serde_json::Value>,
    pub exported: bool,
    pub scraped_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AsinRow {
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.manufacturer.is_none() || self.responsible.is_none()
    }

    /// Decodes the stored contact columns back into a [`DisclosureResult`].
    ///
    /// A `NULL` column decodes as an empty sequence.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Core`] if the stored ASIN no longer validates, or
    /// [`DbError::ContactJson`] if a column does not hold an array of
    /// contact records.
    pub fn to_result(&self) -> Result<DisclosureResult, DbError> {
        let asin = Asin::parse(&self.asin)?;
        let manufacturer = decode_contacts(&self.asin, self.manufacturer.as_ref())?;
        let responsible = decode_contacts(&self.asin, self.responsible.as_ref())?;
        Ok(DisclosureResult::new(asin, manufacturer, responsible))
    }
}

fn decode_contacts(
    asin: &str,
    value: Option<&serde_json::Value>,
) -> Result<Vec<ContactRecord>, DbError> {
    match value {
        None => Ok(Vec::new()),
        Some(value) => {
            serde_json::from_value(value.clone()).map_err(|source| DbError::ContactJson {
                asin: asin.to_string(),
                source,
            })
        }
    }
}

fn encode_contacts(asin: &str, records: &[ContactRecord]) -> Result<serde_json::Value, DbError> {
    serde_json::to_value(records).map_err(|source| DbError::ContactJson {
        asin: asin.to_string(),
        source,
    })
}

/// Registers ASINs for scraping, ignoring ones already present.
///
/// Returns the number of newly inserted rows.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_asins_if_absent(pool: &PgPool, asins: &[Asin]) -> Result<u64, DbError> {
    if asins.is_empty() {
        return Ok(0);
    }

    let values: Vec<String> = asins.iter().map(|a| a.as_str().to_owned()).collect();

    let result = sqlx::query(
        "INSERT INTO asins (asin) \
         SELECT DISTINCT value FROM UNNEST($1::text[]) AS t(value) \
         ON CONFLICT (asin) DO NOTHING",
    )
    .bind(&values)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Returns pending ASINs in registration order.
///
/// `limit = None` returns every pending ASIN.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_pending_asins(pool: &PgPool, limit: Option<i64>) -> Result<Vec<String>, DbError> {
    let rows = sqlx::query_scalar::<_, String>(
        "SELECT asin FROM asins \
         WHERE manufacturer IS NULL OR responsible IS NULL \
         ORDER BY created_at, asin \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Stores the contact data of a successful extraction.
///
/// Failed results are skipped so the ASIN stays pending for the next run;
/// the return value says whether anything was written. Inserts the row if
/// the ASIN was never registered.
///
/// # Errors
///
/// Returns [`DbError::ContactJson`] if the records cannot be encoded, or
/// [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_disclosure(pool: &PgPool, result: &DisclosureResult) -> Result<bool, DbError> {
    if result.is_failed() {
        return Ok(false);
    }

    let asin = result.asin.as_str();
    let manufacturer = encode_contacts(asin, &result.manufacturer)?;
    let responsible = encode_contacts(asin, &result.responsible)?;

    sqlx::query(
        "INSERT INTO asins (asin, manufacturer, responsible, exported, scraped_at) \
         VALUES ($1, $2, $3, FALSE, NOW()) \
         ON CONFLICT (asin) DO UPDATE \
         SET manufacturer = EXCLUDED.manufacturer, \
             responsible = EXCLUDED.responsible, \
             exported = FALSE, \
             scraped_at = NOW(), \
             updated_at = NOW()",
    )
    .bind(asin)
    .bind(manufacturer)
    .bind(responsible)
    .execute(pool)
    .await?;

    Ok(true)
}

/// Returns scraped ASINs ordered by ASIN, optionally only those not yet
/// exported.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_scraped_asins(
    pool: &PgPool,
    only_unexported: bool,
) -> Result<Vec<AsinRow>, DbError> {
    let rows = sqlx::query_as::<_, AsinRow>(
        "SELECT asin, manufacturer, responsible, exported, scraped_at, created_at, updated_at \
         FROM asins \
         WHERE manufacturer IS NOT NULL AND responsible IS NOT NULL \
           AND ($1 = FALSE OR exported = FALSE) \
         ORDER BY asin",
    )
    .bind(only_unexported)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Flags the given ASINs as exported. Returns the number of rows updated.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn mark_exported(pool: &PgPool, asins: &[String]) -> Result<u64, DbError> {
    if asins.is_empty() {
        return Ok(0);
    }

    let result = sqlx::query(
        "UPDATE asins SET exported = TRUE, updated_at = NOW() \
         WHERE asin = ANY($1) AND exported = FALSE",
    )
    .bind(asins)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Returns `(total, pending, unexported)` counts for status reporting.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn asin_counts(pool: &PgPool) -> Result<(i64, i64, i64), DbError> {
    let counts = sqlx::query_as::<_, (i64, i64, i64)>(
        "SELECT COUNT(*), \
                COUNT(*) FILTER (WHERE manufacturer IS NULL OR responsible IS NULL), \
                COUNT(*) FILTER (WHERE manufacturer IS NOT NULL AND responsible IS NOT NULL \
                                   AND exported = FALSE) \
         FROM asins",
    )
    .fetch_one(pool)
    .await?;

    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(
        manufacturer: Option<serde_json::Value>,
        responsible: Option<serde_json::Value>,
    ) -> AsinRow {
        AsinRow {
            asin: "B07XHL9S65".to_string(),
            manufacturer,
            responsible,
            exported: false,
            scraped_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn null_columns_mark_row_pending() {
        assert!(row(None, Some(json!([]))).is_pending());
        assert!(row(Some(json!([])), None).is_pending());
        assert!(!row(Some(json!([])), Some(json!([]))).is_pending());
    }

    #[test]
    fn to_result_decodes_stored_records() {
        let stored = row(
            Some(json!([{
                "name": "Acme Kitchenware GmbH",
                "address": "Hauptstrasse 12, 10115 Berlin, DE",
                "phone": "+49 30 12345678",
                "email": null
            }])),
            Some(json!([])),
        );

        let result = stored.to_result().unwrap();
        assert_eq!(result.asin.as_str(), "B07XHL9S65");
        assert_eq!(result.manufacturer.len(), 1);
        assert_eq!(result.manufacturer[0].name, "Acme Kitchenware GmbH");
        assert_eq!(result.manufacturer[0].phone.as_deref(), Some("+49 30 12345678"));
        assert!(result.manufacturer[0].email.is_none());
        assert!(result.responsible.is_empty());
        assert!(!result.is_failed());
    }

    #[test]
    fn to_result_rejects_non_array_column() {
        let stored = row(Some(json!({"name": "x"})), Some(json!([])));
        let err = stored.to_result().unwrap_err();
        assert!(
            matches!(err, DbError::ContactJson { ref asin, .. } if asin == "B07XHL9S65"),
            "expected ContactJson, got: {err:?}"
        );
    }

    #[test]
    fn encode_contacts_round_trips_sentinel() {
        let value = encode_contacts("B1", &[ContactRecord::not_available()]).unwrap();
        let decoded = decode_contacts("B1", Some(&value)).unwrap();
        assert!(decoded[0].is_not_available());
    }
}
