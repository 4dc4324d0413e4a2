//! Database operations for `scrape_jobs` and `scrape_job_batches`.
//!
//! Job status moves `pending -> processing -> done | failed`; each
//! transition is guarded in SQL so a stale caller cannot skip a step.

use asindb_core::{CoreError, ScrapeStatus};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const JOB_COLUMNS: &str = "id, public_id, trigger_source, status, asins_requested, \
                           results_stored, error_message, created_at, started_at, completed_at";

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `scrape_jobs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScrapeJobRow {
    pub id: i64,
    pub public_id: Uuid,
    pub trigger_source: String,
    pub status: String,
    pub asins_requested: i32,
    pub results_stored: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ScrapeJobRow {
    /// Parses the stored status string.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidScrapeStatus`] for values outside the
    /// known set.
    pub fn status(&self) -> Result<ScrapeStatus, CoreError> {
        self.status.parse()
    }
}

/// A row from the `scrape_job_batches` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScrapeJobBatchRow {
    pub id: i64,
    pub scrape_job_id: i64,
    pub batch_index: i32,
    /// `succeeded` or `failed`.
    pub status: String,
    pub asins_requested: i32,
    pub results_stored: i32,
    pub asins_failed: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// scrape_jobs operations
// ---------------------------------------------------------------------------

/// Creates a new scrape job in `pending` status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_scrape_job(
    pool: &PgPool,
    trigger_source: &str,
    asins_requested: i32,
) -> Result<ScrapeJobRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, ScrapeJobRow>(&format!(
        "INSERT INTO scrape_jobs (public_id, trigger_source, status, asins_requested) \
         VALUES ($1, $2, $3, $4) \
         RETURNING {JOB_COLUMNS}"
    ))
    .bind(public_id)
    .bind(trigger_source)
    .bind(ScrapeStatus::Pending.as_str())
    .bind(asins_requested)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

async fn transition(
    pool: &PgPool,
    id: i64,
    from: ScrapeStatus,
    to: ScrapeStatus,
    results_stored: Option<i32>,
    error_message: Option<&str>,
) -> Result<(), DbError> {
    debug_assert!(from.can_transition_to(to));

    let result = sqlx::query(
        "UPDATE scrape_jobs \
         SET status = $1, \
             started_at = CASE WHEN $1 = 'processing' THEN NOW() ELSE started_at END, \
             completed_at = CASE WHEN $1 IN ('done', 'failed') THEN NOW() ELSE completed_at END, \
             results_stored = COALESCE($2, results_stored), \
             error_message = COALESCE($3, error_message) \
         WHERE id = $4 AND status = $5",
    )
    .bind(to.as_str())
    .bind(results_stored)
    .bind(error_message)
    .bind(id)
    .bind(from.as_str())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidScrapeJobTransition {
            id,
            expected_status: from.as_str(),
        });
    }

    Ok(())
}

/// Marks a job as `processing` and sets `started_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::InvalidScrapeJobTransition`] if the job is not
/// `pending`, or [`DbError::Sqlx`] if the update fails.
pub async fn start_scrape_job(pool: &PgPool, id: i64) -> Result<(), DbError> {
    transition(
        pool,
        id,
        ScrapeStatus::Pending,
        ScrapeStatus::Processing,
        None,
        None,
    )
    .await
}

/// Marks a job as `done`, sets `completed_at` and `results_stored`.
///
/// # Errors
///
/// Returns [`DbError::InvalidScrapeJobTransition`] if the job is not
/// `processing`, or [`DbError::Sqlx`] if the update fails.
pub async fn complete_scrape_job(
    pool: &PgPool,
    id: i64,
    results_stored: i32,
) -> Result<(), DbError> {
    transition(
        pool,
        id,
        ScrapeStatus::Processing,
        ScrapeStatus::Done,
        Some(results_stored),
        None,
    )
    .await
}

/// Marks a job as `failed`, sets `completed_at` and `error_message`.
///
/// # Errors
///
/// Returns [`DbError::InvalidScrapeJobTransition`] if the job is not
/// `processing`, or [`DbError::Sqlx`] if the update fails.
pub async fn fail_scrape_job(pool: &PgPool, id: i64, error_message: &str) -> Result<(), DbError> {
    transition(
        pool,
        id,
        ScrapeStatus::Processing,
        ScrapeStatus::Failed,
        None,
        Some(error_message),
    )
    .await
}

/// Fetches a single job by its internal `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_scrape_job(pool: &PgPool, id: i64) -> Result<ScrapeJobRow, DbError> {
    sqlx::query_as::<_, ScrapeJobRow>(&format!(
        "SELECT {JOB_COLUMNS} FROM scrape_jobs WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Returns the most recently created job, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn latest_scrape_job(pool: &PgPool) -> Result<Option<ScrapeJobRow>, DbError> {
    let row = sqlx::query_as::<_, ScrapeJobRow>(&format!(
        "SELECT {JOB_COLUMNS} FROM scrape_jobs ORDER BY created_at DESC, id DESC LIMIT 1"
    ))
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

// ---------------------------------------------------------------------------
// scrape_job_batches operations
// ---------------------------------------------------------------------------

/// Per-batch counts written by [`record_scrape_job_batch`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchCounts {
    pub asins_requested: i32,
    pub results_stored: i32,
    pub asins_failed: i32,
}

/// Inserts or updates the result row for one batch of a job.
///
/// A batch with an `error_message` is recorded as `failed`, otherwise as
/// `succeeded`. Conflicts on `(scrape_job_id, batch_index)` update in place.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn record_scrape_job_batch(
    pool: &PgPool,
    job_id: i64,
    batch_index: i32,
    counts: BatchCounts,
    error_message: Option<&str>,
) -> Result<(), DbError> {
    let status = if error_message.is_some() {
        "failed"
    } else {
        "succeeded"
    };

    sqlx::query(
        "INSERT INTO scrape_job_batches \
             (scrape_job_id, batch_index, status, asins_requested, results_stored, \
              asins_failed, error_message) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         ON CONFLICT (scrape_job_id, batch_index) DO UPDATE SET \
             status          = EXCLUDED.status, \
             asins_requested = EXCLUDED.asins_requested, \
             results_stored  = EXCLUDED.results_stored, \
             asins_failed    = EXCLUDED.asins_failed, \
             error_message   = EXCLUDED.error_message",
    )
    .bind(job_id)
    .bind(batch_index)
    .bind(status)
    .bind(counts.asins_requested)
    .bind(counts.results_stored)
    .bind(counts.asins_failed)
    .bind(error_message)
    .execute(pool)
    .await?;

    Ok(())
}

/// Returns all batch rows for a job, ordered by batch index.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_scrape_job_batches(
    pool: &PgPool,
    job_id: i64,
) -> Result<Vec<ScrapeJobBatchRow>, DbError> {
    let rows = sqlx::query_as::<_, ScrapeJobBatchRow>(
        "SELECT id, scrape_job_id, batch_index, status, asins_requested, results_stored, \
                asins_failed, error_message, created_at \
         FROM scrape_job_batches \
         WHERE scrape_job_id = $1 \
         ORDER BY batch_index",
    )
    .bind(job_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
