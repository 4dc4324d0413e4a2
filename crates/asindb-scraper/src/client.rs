use std::time::Duration;

use asindb_core::{AppConfig, Asin, DisclosureResult};
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, COOKIE, REFERER,
};
use reqwest::{Client, Url};

use crate::error::ScraperError;
use crate::extract::extract_disclosure;
use crate::rate_limit::retry_with_backoff;

/// Settings for [`DisclosureClient`].
#[derive(Debug, Clone)]
pub struct DisclosureClientConfig {
    pub endpoint_url: String,
    pub referer: String,
    /// Per-request deadline covering connect, send, and body download.
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Value for the `x-amz-acp-params` header, if the endpoint needs one.
    pub acp_params: Option<String>,
    pub cookie: Option<String>,
    pub max_retries: u32,
    pub backoff_base_secs: u64,
}

impl DisclosureClientConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            endpoint_url: config.scraper_endpoint_url.clone(),
            referer: config.scraper_referer.clone(),
            timeout_secs: config.scraper_request_timeout_secs,
            user_agent: config.scraper_user_agent.clone(),
            acp_params: config.scraper_acp_params.clone(),
            cookie: config.scraper_cookie.clone(),
            max_retries: config.scraper_max_retries,
            backoff_base_secs: config.scraper_retry_backoff_base_secs,
        }
    }
}

/// HTTP client for the storefront's disclosure-content endpoint.
///
/// Each call POSTs `{"asin": "..."}` with a browser-like header set and
/// receives an HTML fragment. Non-2xx responses become typed errors; 429,
/// network failures, and timeouts are retried with exponential backoff.
pub struct DisclosureClient {
    client: Client,
    endpoint: Url,
    timeout_secs: u64,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl DisclosureClient {
    /// Creates a client with the configured deadline, headers, and retry
    /// policy.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::InvalidEndpoint`] if the endpoint is not an
    ///   absolute `http(s)` URL.
    /// - [`ScraperError::InvalidHeader`] if a configured header value
    ///   contains characters HTTP does not allow.
    /// - [`ScraperError::Http`] if the underlying `reqwest::Client` cannot
    ///   be constructed.
    pub fn new(config: &DisclosureClientConfig) -> Result<Self, ScraperError> {
        let endpoint = parse_endpoint(&config.endpoint_url)?;
        let headers = browser_headers(config)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs.min(10)))
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint,
            timeout_secs: config.timeout_secs,
            max_retries: config.max_retries,
            backoff_base_secs: config.backoff_base_secs,
        })
    }

    /// Fetches the raw disclosure fragment for one ASIN.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Timeout`] if the deadline expired on the last attempt.
    /// - [`ScraperError::RateLimited`] on HTTP 429 after all retries.
    /// - [`ScraperError::UnexpectedStatus`] on any other non-2xx status.
    /// - [`ScraperError::Http`] on network failure after all retries.
    pub async fn fetch_fragment(&self, asin: &Asin) -> Result<String, ScraperError> {
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || async move {
            let response = self
                .client
                .post(self.endpoint.clone())
                .json(&serde_json::json!({ "asin": asin.as_str() }))
                .send()
                .await
                .map_err(|e| self.transport_error(e, asin))?;
            let status = response.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                let retry_after_secs = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(60);
                return Err(ScraperError::RateLimited {
                    asin: asin.to_string(),
                    retry_after_secs,
                });
            }

            if !status.is_success() {
                return Err(ScraperError::UnexpectedStatus {
                    status: status.as_u16(),
                    asin: asin.to_string(),
                });
            }

            let body = response
                .text()
                .await
                .map_err(|e| self.transport_error(e, asin))?;
            tracing::debug!(asin = %asin, bytes = body.len(), "fetched disclosure fragment");
            Ok(body)
        })
        .await
    }

    /// Fetches and parses the disclosure data for one ASIN.
    ///
    /// # Errors
    ///
    /// Propagates fetch errors from [`Self::fetch_fragment`] and
    /// [`ScraperError::UnrecognizedMarkup`] from extraction.
    pub async fn extract(&self, asin: &Asin) -> Result<DisclosureResult, ScraperError> {
        let body = self.fetch_fragment(asin).await?;
        extract_disclosure(asin, &body)
    }

    fn transport_error(&self, err: reqwest::Error, asin: &Asin) -> ScraperError {
        if err.is_timeout() {
            ScraperError::Timeout {
                asin: asin.to_string(),
                timeout_secs: self.timeout_secs,
            }
        } else {
            ScraperError::Http(err)
        }
    }
}

fn parse_endpoint(url: &str) -> Result<Url, ScraperError> {
    let parsed = Url::parse(url).map_err(|e| ScraperError::InvalidEndpoint {
        url: url.to_owned(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ScraperError::InvalidEndpoint {
            url: url.to_owned(),
            reason: format!("unsupported scheme \"{}\"", parsed.scheme()),
        });
    }
    Ok(parsed)
}

/// Builds the header set the storefront's own side-sheet request carries.
fn browser_headers(config: &DisclosureClientConfig) -> Result<HeaderMap, ScraperError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("text/html, application/json"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-GB,en;q=0.9"));
    headers.insert(
        HeaderName::from_static("x-requested-with"),
        HeaderValue::from_static("XMLHttpRequest"),
    );
    headers.insert(
        HeaderName::from_static("x-amz-amabot-click-attributes"),
        HeaderValue::from_static("disable"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-dest"),
        HeaderValue::from_static("empty"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-mode"),
        HeaderValue::from_static("cors"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-site"),
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        HeaderName::from_static("sec-ch-ua-mobile"),
        HeaderValue::from_static("?1"),
    );
    headers.insert(
        HeaderName::from_static("sec-ch-ua-platform"),
        HeaderValue::from_static("\"Android\""),
    );
    headers.insert(
        HeaderName::from_static("viewport-width"),
        HeaderValue::from_static("1145"),
    );

    headers.insert(REFERER, header_value("referer", &config.referer)?);
    if let Some(acp) = &config.acp_params {
        headers.insert(
            HeaderName::from_static("x-amz-acp-params"),
            header_value("x-amz-acp-params", acp)?,
        );
    }
    if let Some(cookie) = &config.cookie {
        let mut value = header_value("cookie", cookie)?;
        value.set_sensitive(true);
        headers.insert(COOKIE, value);
    }

    Ok(headers)
}

fn header_value(name: &'static str, value: &str) -> Result<HeaderValue, ScraperError> {
    HeaderValue::from_str(value).map_err(|e| ScraperError::InvalidHeader {
        name,
        reason: e.to_string(),
    })
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
