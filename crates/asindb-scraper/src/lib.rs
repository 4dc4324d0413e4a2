pub mod batch;
pub mod classify;
pub mod client;
pub mod error;
pub mod extract;
mod rate_limit;
mod selectors;

pub use batch::{prepare_asins, BatchConfig, BatchOutcome, BatchScraper};
pub use classify::{classify, looks_like_street_address, FieldKind};
pub use client::{DisclosureClient, DisclosureClientConfig};
pub use error::ScraperError;
pub use extract::extract_disclosure;
