//! Retry utilities for the disclosure client.
//!
//! Transient failures (429, network errors, timeouts) are retried with
//! exponential backoff; everything else propagates immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

const MAX_DELAY_SECS: u64 = 120;

/// Returns `true` if `err` represents a transient condition worth retrying.
///
/// Retriable: [`ScraperError::RateLimited`], [`ScraperError::Http`],
/// [`ScraperError::Timeout`]. A non-2xx status other than 429 or an
/// unrecognized body would come back the same on a second try.
fn is_retriable(err: &ScraperError) -> bool {
    matches!(
        err,
        ScraperError::RateLimited { .. } | ScraperError::Http(_) | ScraperError::Timeout { .. }
    )
}

/// Executes `operation` with exponential backoff retries on transient errors.
///
/// The wait before the n-th retry is `backoff_base_secs * 2^(n-1)` seconds,
/// capped at two minutes and scaled by a random factor in `[0.75, 1.25)` so
/// concurrent identifiers do not retry in lockstep. With `max_retries = 2`
/// the operation runs at most three times.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;

                let computed = backoff_base_secs.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped_ms = computed.min(MAX_DELAY_SECS).saturating_mul(1000);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped_ms as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;

                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient disclosure fetch error, retrying after backoff"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
