//! `scrape` and `fetch` command handlers.
//!
//! `scrape` drives a job through `pending -> processing -> done | failed`,
//! persisting each batch as soon as it finishes. Per-ASIN failures are
//! logged and left pending for the next run, as are results that could not
//! be written. The job fails only when every batch failed.

use asindb_core::{AppConfig, Asin};
use asindb_db::BatchCounts;
use asindb_scraper::{
    BatchConfig, BatchOutcome, BatchScraper, DisclosureClient, DisclosureClientConfig,
};
use futures::StreamExt;

use crate::fail_job_best_effort;

const TRIGGER_SOURCE: &str = "cli";

fn build_scraper(config: &AppConfig) -> anyhow::Result<BatchScraper> {
    let client = DisclosureClient::new(&DisclosureClientConfig::from_app_config(config))?;
    Ok(BatchScraper::new(client, BatchConfig::from_app_config(config)))
}

fn to_i32(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Scrapes the given identifiers without touching the database and prints
/// the results as pretty JSON.
pub(crate) async fn run_fetch(config: &AppConfig, raw: &[String]) -> anyhow::Result<()> {
    let asins = asindb_scraper::prepare_asins(raw);
    if asins.is_empty() {
        anyhow::bail!("no valid ASINs given");
    }

    let scraper = build_scraper(config)?;
    let outcomes = scraper.run_batches(asins).await;
    let results: Vec<_> = outcomes.into_iter().flat_map(|o| o.results).collect();

    let failed = results.iter().filter(|r| r.is_failed()).count();
    if failed > 0 {
        tracing::warn!(failed, total = results.len(), "some ASINs failed");
    }

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

/// Scrapes pending ASINs and stores successful results batch by batch.
///
/// When `dry_run` is `true` the pending ASINs are listed and nothing is
/// fetched or written.
///
/// # Errors
///
/// Returns an error if the scraper cannot be built, the job cannot be
/// created or transitioned, or every batch failed.
pub(crate) async fn run_scrape(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    limit: Option<i64>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let pending = asindb_db::list_pending_asins(pool, limit).await?;
    let asins = asindb_scraper::prepare_asins(&pending);

    if asins.is_empty() {
        println!("no pending ASINs");
        return Ok(());
    }

    if dry_run {
        let batch_size = config.scraper_batch_size.max(1);
        println!(
            "[dry-run] would scrape {} ASIN(s) in {} batch(es) of up to {batch_size}",
            asins.len(),
            asins.len().div_ceil(batch_size),
        );
        for asin in &asins {
            println!("  {asin}");
        }
        return Ok(());
    }

    let scraper = build_scraper(config)?;

    let job = asindb_db::create_scrape_job(pool, TRIGGER_SOURCE, to_i32(asins.len())).await?;
    if let Err(e) = asindb_db::start_scrape_job(pool, job.id).await {
        fail_job_best_effort(pool, job.id, &format!("{e:#}")).await;
        return Err(e.into());
    }
    tracing::info!(
        job_id = job.id,
        public_id = %job.public_id,
        asins = asins.len(),
        "scrape job started"
    );

    let totals = scrape_batches(pool, &scraper, job.id, asins).await;

    if totals.failed_asins > 0 {
        tracing::warn!(
            job_id = job.id,
            failed_asins = totals.failed_asins,
            "some ASINs failed and remain pending"
        );
    }

    if totals.batches > 0 && totals.failed_batches == totals.batches {
        let message = format!("all {} batches failed", totals.failed_batches);
        fail_job_best_effort(pool, job.id, &message).await;
        anyhow::bail!("{message}");
    }

    if let Err(err) = asindb_db::complete_scrape_job(pool, job.id, totals.stored).await {
        fail_job_best_effort(pool, job.id, &format!("{err:#}")).await;
        return Err(err.into());
    }

    println!(
        "scrape job {} done: {} stored, {} failed ASIN(s), {}/{} batch(es) failed",
        job.id, totals.stored, totals.failed_asins, totals.failed_batches, totals.batches
    );
    Ok(())
}

#[derive(Debug, Default)]
struct ScrapeTotals {
    stored: i32,
    failed_asins: usize,
    batches: usize,
    failed_batches: usize,
}

async fn scrape_batches(
    pool: &sqlx::PgPool,
    scraper: &BatchScraper,
    job_id: i64,
    asins: Vec<Asin>,
) -> ScrapeTotals {
    let mut totals = ScrapeTotals::default();
    let mut outcomes = std::pin::pin!(scraper.batches(asins));

    while let Some(outcome) = outcomes.next().await {
        let persisted = persist_outcome(pool, &outcome).await;
        let (counts, error) = batch_summary(&outcome, persisted);

        totals.batches += 1;
        totals.stored = totals.stored.saturating_add(counts.results_stored);
        totals.failed_asins += usize::try_from(counts.asins_failed).unwrap_or(0);
        if error.is_some() {
            totals.failed_batches += 1;
        }

        if let Err(err) = asindb_db::record_scrape_job_batch(
            pool,
            job_id,
            to_i32(outcome.index),
            counts,
            error.as_deref(),
        )
        .await
        {
            tracing::error!(job_id, batch = outcome.index, error = %err, "failed to record batch");
        }
    }

    totals
}

/// How many results of a batch were written and how many writes failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Persisted {
    stored: i32,
    store_failed: usize,
}

/// Stores every successful result of a batch.
async fn persist_outcome(pool: &sqlx::PgPool, outcome: &BatchOutcome) -> Persisted {
    let mut persisted = Persisted::default();
    for result in outcome.successful_results() {
        match asindb_db::upsert_disclosure(pool, result).await {
            Ok(true) => persisted.stored = persisted.stored.saturating_add(1),
            Ok(false) => {}
            Err(err) => {
                persisted.store_failed += 1;
                tracing::error!(asin = %result.asin, error = %err, "failed to store disclosure");
            }
        }
    }
    persisted
}

/// Counts for the batch row plus the error that marks the batch failed.
///
/// ASINs whose result could not be written count as failed alongside
/// extraction failures. A batch is failed when its task failed, or when
/// writes failed and nothing was stored.
fn batch_summary(outcome: &BatchOutcome, persisted: Persisted) -> (BatchCounts, Option<String>) {
    let failed = outcome.failed_count() + persisted.store_failed;
    let counts = BatchCounts {
        asins_requested: to_i32(outcome.requested),
        results_stored: persisted.stored,
        asins_failed: to_i32(failed),
    };

    let error = match &outcome.error {
        Some(message) => Some(message.clone()),
        None if persisted.store_failed > 0 && persisted.stored == 0 => Some(format!(
            "failed to store {} result(s)",
            persisted.store_failed
        )),
        None => None,
    };

    (counts, error)
}
