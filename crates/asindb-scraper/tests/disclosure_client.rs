//! Integration tests for `DisclosureClient`.
//!
//! Uses `wiremock` to stand up a local HTTP server for each test so no real
//! network traffic is made.

use std::time::Duration;

use asindb_core::{Asin, FailureKind};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use asindb_scraper::{DisclosureClient, DisclosureClientConfig, ScraperError};

const ENDPOINT_PATH: &str = "/acp/getRspManufacturerContent";
const TWO_SECTIONS: &str = include_str!("fixtures/two_sections.html");
const NOT_AVAILABLE_PAGE: &str = include_str!("fixtures/not_available.html");

fn client_config(server: &MockServer) -> DisclosureClientConfig {
    DisclosureClientConfig {
        endpoint_url: format!("{}{ENDPOINT_PATH}?page-type=Detail", server.uri()),
        referer: format!("{}/", server.uri()),
        timeout_secs: 5,
        user_agent: "asindb-test/0.1".to_owned(),
        acp_params: None,
        cookie: None,
        max_retries: 0,
        backoff_base_secs: 0,
    }
}

/// Builds a `DisclosureClient` for tests: 5-second timeout, no retries.
fn test_client(server: &MockServer) -> DisclosureClient {
    DisclosureClient::new(&client_config(server)).expect("failed to build test DisclosureClient")
}

fn asin(value: &str) -> Asin {
    Asin::parse(value).unwrap()
}

#[tokio::test]
async fn extract_posts_asin_as_json_and_parses_fragment() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT_PATH))
        .and(body_json(json!({ "asin": "B07XHL9S65" })))
        .and(header("x-requested-with", "XMLHttpRequest"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TWO_SECTIONS))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let result = client.extract(&asin("B07XHL9S65")).await;

    assert!(result.is_ok(), "expected Ok, got: {result:?}");
    let result = result.unwrap();
    assert_eq!(result.asin.as_str(), "B07XHL9S65");
    assert_eq!(result.manufacturer[0].name, "Acme Kitchenware GmbH");
    assert_eq!(result.responsible[0].name, "EU Compliance Partners B.V.");
}

#[tokio::test]
async fn extract_returns_sentinel_for_not_available_section() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(NOT_AVAILABLE_PAGE))
        .mount(&server)
        .await;

    let result = test_client(&server)
        .extract(&asin("B0NOTAVAIL"))
        .await
        .unwrap();

    assert_eq!(result.responsible.len(), 1);
    assert!(result.responsible[0].is_not_available());
}

#[tokio::test]
async fn extract_sends_configured_cookie() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT_PATH))
        .and(header("cookie", "session-id=123"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TWO_SECTIONS))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = client_config(&server);
    config.cookie = Some("session-id=123".to_owned());
    let client = DisclosureClient::new(&config).unwrap();

    assert!(client.extract(&asin("B07XHL9S65")).await.is_ok());
}

#[tokio::test]
async fn non_success_status_is_fetch_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .extract(&asin("B07XHL9S65"))
        .await
        .unwrap_err();

    assert!(
        matches!(err, ScraperError::UnexpectedStatus { status: 503, .. }),
        "expected UnexpectedStatus(503), got: {err:?}"
    );
    assert_eq!(err.failure_kind(), FailureKind::Fetch);
}

#[tokio::test]
async fn rate_limited_response_carries_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT_PATH))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "17"))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .fetch_fragment(&asin("B07XHL9S65"))
        .await
        .unwrap_err();

    assert!(
        matches!(
            err,
            ScraperError::RateLimited {
                retry_after_secs: 17,
                ..
            }
        ),
        "expected RateLimited(17), got: {err:?}"
    );
}

#[tokio::test]
async fn rate_limited_response_is_retried_until_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT_PATH))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(TWO_SECTIONS))
        .mount(&server)
        .await;

    let mut config = client_config(&server);
    config.max_retries = 2;
    let client = DisclosureClient::new(&config).unwrap();

    let result = client.extract(&asin("B07XHL9S65")).await;
    assert!(result.is_ok(), "expected Ok after retry, got: {result:?}");
}

#[tokio::test]
async fn slow_response_times_out_as_fetch_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(TWO_SECTIONS)
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let mut config = client_config(&server);
    config.timeout_secs = 1;
    let client = DisclosureClient::new(&config).unwrap();

    let err = client.extract(&asin("B07XHL9S65")).await.unwrap_err();
    assert!(
        matches!(err, ScraperError::Timeout { timeout_secs: 1, .. }),
        "expected Timeout, got: {err:?}"
    );
    assert_eq!(err.failure_kind(), FailureKind::Fetch);
}

#[tokio::test]
async fn json_envelope_is_parse_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "error": "robot check" })),
        )
        .mount(&server)
        .await;

    let err = test_client(&server)
        .extract(&asin("B07XHL9S65"))
        .await
        .unwrap_err();

    assert!(
        matches!(err, ScraperError::UnrecognizedMarkup { .. }),
        "expected UnrecognizedMarkup, got: {err:?}"
    );
    assert_eq!(err.failure_kind(), FailureKind::Parse);
}
