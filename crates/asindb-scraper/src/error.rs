use asindb_core::FailureKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request for {asin} timed out after {timeout_secs}s")]
    Timeout { asin: String, timeout_secs: u64 },

    #[error("rate limited while fetching {asin} (retry after {retry_after_secs}s)")]
    RateLimited { asin: String, retry_after_secs: u64 },

    #[error("unexpected HTTP status {status} for {asin}")]
    UnexpectedStatus { status: u16, asin: String },

    #[error("unrecognized disclosure markup for {asin}: {reason}")]
    UnrecognizedMarkup { asin: String, reason: String },

    #[error("invalid disclosure endpoint \"{url}\": {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("invalid value for header {name}: {reason}")]
    InvalidHeader { name: &'static str, reason: String },
}

impl ScraperError {
    /// Maps the error onto the failure marker recorded in a
    /// [`asindb_core::DisclosureResult`].
    #[must_use]
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            ScraperError::UnrecognizedMarkup { .. } => FailureKind::Parse,
            ScraperError::Http(_)
            | ScraperError::Timeout { .. }
            | ScraperError::RateLimited { .. }
            | ScraperError::UnexpectedStatus { .. }
            | ScraperError::InvalidEndpoint { .. }
            | ScraperError::InvalidHeader { .. } => FailureKind::Fetch,
        }
    }
}
