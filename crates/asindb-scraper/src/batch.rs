//! Batch orchestration: fan out extraction per ASIN and collect one
//! [`DisclosureResult`] per input, failures included.
//!
//! Within a batch, ASINs run concurrently up to `max_concurrent`. Batches
//! run one after another, each in its own task, so a panic or failure in
//! one batch is reported as zero results for that batch and the next batch
//! still runs.

use std::sync::Arc;
use std::time::Duration;

use asindb_core::{normalize_asins, AppConfig, Asin, DisclosureResult};
use futures::stream::{self, Stream, StreamExt};
use tokio::time::Instant;

use crate::client::DisclosureClient;

#[derive(Debug, Clone, Copy)]
pub struct BatchConfig {
    /// Ceiling on in-flight requests within one batch.
    pub max_concurrent: usize,
    /// Minimum spacing between request starts within a batch, shared by
    /// all concurrent slots.
    pub inter_request_delay_ms: u64,
    pub batch_size: usize,
    /// Delay between consecutive batches.
    pub inter_batch_delay_ms: u64,
}

impl BatchConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_concurrent: config.scraper_max_concurrent_requests,
            inter_request_delay_ms: config.scraper_inter_request_delay_ms,
            batch_size: config.scraper_batch_size,
            inter_batch_delay_ms: config.scraper_inter_batch_delay_ms,
        }
    }
}

/// Outcome of one batch.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// Zero-based position of the batch within the run.
    pub index: usize,
    /// Number of ASINs the batch was given.
    pub requested: usize,
    /// One entry per requested ASIN, or empty when the batch itself failed.
    pub results: Vec<DisclosureResult>,
    /// Set when the batch failed as a whole.
    pub error: Option<String>,
}

impl BatchOutcome {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    /// Results whose extraction did not fail.
    pub fn successful_results(&self) -> impl Iterator<Item = &DisclosureResult> {
        self.results.iter().filter(|r| !r.is_failed())
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_failed()).count()
    }
}

/// Normalizes raw identifiers at the orchestrator boundary.
///
/// Rejected inputs are logged and skipped; accepted ones keep their order
/// and duplicates.
#[must_use]
pub fn prepare_asins<I, S>(raw: I) -> Vec<Asin>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let (accepted, rejected) = normalize_asins(raw);
    for err in &rejected {
        tracing::warn!(error = %err, "skipping invalid ASIN");
    }
    accepted
}

#[derive(Clone)]
pub struct BatchScraper {
    client: Arc<DisclosureClient>,
    config: BatchConfig,
}

impl BatchScraper {
    #[must_use]
    pub fn new(client: DisclosureClient, config: BatchConfig) -> Self {
        Self {
            client: Arc::new(client),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> BatchConfig {
        self.config
    }

    /// Extracts every ASIN in `asins` and returns one result per input, in
    /// completion order.
    ///
    /// Never fails: an ASIN whose fetch or parse fails is returned with
    /// empty sequences and a failure marker.
    pub async fn run(&self, asins: &[Asin]) -> Vec<DisclosureResult> {
        let max_concurrent = self.config.max_concurrent.max(1);
        let delay_ms = self.config.inter_request_delay_ms;
        let started = Instant::now();

        stream::iter(asins.iter().cloned().enumerate())
            .map(|(position, asin)| {
                let client = Arc::clone(&self.client);
                async move {
                    let offset = request_start_offset(position, delay_ms);
                    if !offset.is_zero() {
                        tokio::time::sleep_until(started + offset).await;
                    }
                    extract_one(&client, asin).await
                }
            })
            .buffer_unordered(max_concurrent)
            .collect()
            .await
    }

    /// Runs one batch in its own task so a panic inside it is contained.
    pub async fn run_batch(&self, index: usize, asins: Vec<Asin>) -> BatchOutcome {
        let requested = asins.len();
        let scraper = self.clone();
        let handle = tokio::spawn(async move { scraper.run(&asins).await });

        match handle.await {
            Ok(results) => {
                let outcome = BatchOutcome {
                    index,
                    requested,
                    results,
                    error: None,
                };
                tracing::info!(
                    batch = index,
                    requested,
                    failed = outcome.failed_count(),
                    "batch complete"
                );
                outcome
            }
            Err(join_err) => {
                tracing::error!(batch = index, error = %join_err, "batch task failed");
                BatchOutcome {
                    index,
                    requested,
                    results: Vec::new(),
                    error: Some(format!("batch task failed: {join_err}")),
                }
            }
        }
    }

    /// Splits `asins` into batches of `batch_size` and yields each outcome as
    /// soon as its batch finishes, waiting `inter_batch_delay_ms` between
    /// batches.
    pub fn batches(&self, asins: Vec<Asin>) -> impl Stream<Item = BatchOutcome> + '_ {
        let batch_size = self.config.batch_size.max(1);
        let delay_ms = self.config.inter_batch_delay_ms;
        let chunks: Vec<Vec<Asin>> = asins.chunks(batch_size).map(<[Asin]>::to_vec).collect();

        stream::iter(chunks.into_iter().enumerate()).then(move |(index, chunk)| async move {
            if index > 0 && delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
            self.run_batch(index, chunk).await
        })
    }

    /// Runs every batch and collects the outcomes.
    pub async fn run_batches(&self, asins: Vec<Asin>) -> Vec<BatchOutcome> {
        self.batches(asins).collect().await
    }
}

/// Earliest start of the request at `position`, relative to the start of
/// the batch. Request starts are spaced `delay_ms` apart no matter how many
/// run concurrently.
fn request_start_offset(position: usize, delay_ms: u64) -> Duration {
    let position = u64::try_from(position).unwrap_or(u64::MAX);
    Duration::from_millis(delay_ms.saturating_mul(position))
}

async fn extract_one(client: &DisclosureClient, asin: Asin) -> DisclosureResult {
    match client.extract(&asin).await {
        Ok(result) => result,
        Err(err) => {
            let kind = err.failure_kind();
            tracing::warn!(asin = %asin, kind = %kind, error = %err, "disclosure extraction failed");
            DisclosureResult::failed(asin, kind, err.to_string())
        }
    }
}
