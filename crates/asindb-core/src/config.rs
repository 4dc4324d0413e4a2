use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Disclosure-content endpoint the storefront's product page calls to render
/// the manufacturer / responsible-person side sheet.
pub const DEFAULT_ENDPOINT_URL: &str = "https://www.amazon.de/acp/buffet-disclaimers-card/buffet-disclaimers-card-7f81ff53-6e78-44f9-a76f-2ae337b06462-1770860106391/getRspManufacturerContent?page-type=Detail&stamp=1771072578643";

pub const DEFAULT_REFERER: &str = "https://www.amazon.de/";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 6.0; Nexus 5 Build/MRA58N) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Mobile Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function,
/// so parsing can be tested against a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_positive_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let value = parse_u64(var, default)?;
        if value == 0 {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(value)
    };

    let parse_positive_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        let value = raw
            .parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })?;
        if value == 0 {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(value)
    };

    let database_url = optional("DATABASE_URL");
    let env = parse_environment(&or_default("ASINDB_ENV", "development"))?;
    let log_level = or_default("ASINDB_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("ASINDB_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("ASINDB_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("ASINDB_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let scraper_endpoint_url = or_default("ASINDB_SCRAPER_ENDPOINT_URL", DEFAULT_ENDPOINT_URL);
    let scraper_referer = or_default("ASINDB_SCRAPER_REFERER", DEFAULT_REFERER);
    let scraper_request_timeout_secs =
        parse_positive_u64("ASINDB_SCRAPER_REQUEST_TIMEOUT_SECS", "30")?;
    let scraper_user_agent = or_default("ASINDB_SCRAPER_USER_AGENT", DEFAULT_USER_AGENT);
    let scraper_acp_params = optional("ASINDB_SCRAPER_ACP_PARAMS");
    let scraper_cookie = optional("ASINDB_SCRAPER_COOKIE");
    let scraper_max_concurrent_requests =
        parse_positive_usize("ASINDB_SCRAPER_MAX_CONCURRENT_REQUESTS", "4")?;
    let scraper_inter_request_delay_ms = parse_u64("ASINDB_SCRAPER_INTER_REQUEST_DELAY_MS", "250")?;
    let scraper_batch_size = parse_positive_usize("ASINDB_SCRAPER_BATCH_SIZE", "100")?;
    let scraper_inter_batch_delay_ms = parse_u64("ASINDB_SCRAPER_INTER_BATCH_DELAY_MS", "5000")?;
    let scraper_max_retries = parse_u32("ASINDB_SCRAPER_MAX_RETRIES", "2")?;
    let scraper_retry_backoff_base_secs =
        parse_u64("ASINDB_SCRAPER_RETRY_BACKOFF_BASE_SECS", "5")?;

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        scraper_endpoint_url,
        scraper_referer,
        scraper_request_timeout_secs,
        scraper_user_agent,
        scraper_acp_params,
        scraper_cookie,
        scraper_max_concurrent_requests,
        scraper_inter_request_delay_ms,
        scraper_batch_size,
        scraper_inter_batch_delay_ms,
        scraper_max_retries,
        scraper_retry_backoff_base_secs,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "ASINDB_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
