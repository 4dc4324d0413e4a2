pub mod app_config;
pub mod config;
pub mod disclosure;
pub mod export;
pub mod jobs;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use disclosure::{
    normalize_asins, Asin, ContactRecord, DisclosureResult, ExtractionFailure, FailureKind,
    NOT_AVAILABLE,
};
pub use export::{flatten_results, ExportRow, ExportSheet, EXPORT_HEADINGS};
pub use jobs::ScrapeStatus;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid ASIN \"{asin}\": {reason}")]
    InvalidAsin { asin: String, reason: String },

    #[error("invalid scrape status: {0}")]
    InvalidScrapeStatus(String),
}
