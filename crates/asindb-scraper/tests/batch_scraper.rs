//! Integration tests for `BatchScraper`: per-ASIN isolation, batching, and
//! the one-result-per-input contract.

use std::time::{Duration, Instant};

use asindb_core::{Asin, FailureKind};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use asindb_scraper::{BatchConfig, BatchScraper, DisclosureClient, DisclosureClientConfig};

const ENDPOINT_PATH: &str = "/acp/getRspManufacturerContent";
const TWO_SECTIONS: &str = include_str!("fixtures/two_sections.html");
const MULTIPLE_PARTIES: &str = include_str!("fixtures/multiple_parties.html");

fn scraper(server: &MockServer, timeout_secs: u64, batch_size: usize) -> BatchScraper {
    scraper_with_delay(server, timeout_secs, batch_size, 0)
}

fn scraper_with_delay(
    server: &MockServer,
    timeout_secs: u64,
    batch_size: usize,
    inter_request_delay_ms: u64,
) -> BatchScraper {
    let client = DisclosureClient::new(&DisclosureClientConfig {
        endpoint_url: format!("{}{ENDPOINT_PATH}", server.uri()),
        referer: format!("{}/", server.uri()),
        timeout_secs,
        user_agent: "asindb-test/0.1".to_owned(),
        acp_params: None,
        cookie: None,
        max_retries: 0,
        backoff_base_secs: 0,
    })
    .expect("failed to build test DisclosureClient");

    BatchScraper::new(
        client,
        BatchConfig {
            max_concurrent: 4,
            inter_request_delay_ms,
            batch_size,
            inter_batch_delay_ms: 0,
        },
    )
}

async fn mount_page(server: &MockServer, asin: &str, body: &str) {
    Mock::given(method("POST"))
        .and(path(ENDPOINT_PATH))
        .and(body_json(json!({ "asin": asin })))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn asins(values: &[&str]) -> Vec<Asin> {
    values.iter().map(|v| Asin::parse(v).unwrap()).collect()
}

#[tokio::test]
async fn timed_out_asin_yields_empty_failed_result_and_others_complete() {
    let server = MockServer::start().await;
    mount_page(&server, "B07XHL9S65", TWO_SECTIONS).await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT_PATH))
        .and(body_json(json!({ "asin": "B000BADASIN" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(TWO_SECTIONS)
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let results = scraper(&server, 1, 100)
        .run(&asins(&["B07XHL9S65", "B000BADASIN"]))
        .await;

    assert_eq!(results.len(), 2, "expected one result per input ASIN");

    let good = results
        .iter()
        .find(|r| r.asin.as_str() == "B07XHL9S65")
        .expect("populated result missing");
    assert!(good.failure.is_none());
    assert_eq!(good.manufacturer.len(), 1);
    assert_eq!(good.responsible.len(), 1);

    let bad = results
        .iter()
        .find(|r| r.asin.as_str() == "B000BADASIN")
        .expect("failed result missing");
    assert!(bad.manufacturer.is_empty());
    assert!(bad.responsible.is_empty());
    assert_eq!(bad.failure.as_ref().map(|f| f.kind), Some(FailureKind::Fetch));
}

#[tokio::test]
async fn one_failing_asin_does_not_affect_the_rest_of_the_batch() {
    let server = MockServer::start().await;
    for asin in ["B0GOOD1", "B0GOOD2", "B0GOOD3"] {
        mount_page(&server, asin, TWO_SECTIONS).await;
    }
    Mock::given(method("POST"))
        .and(path(ENDPOINT_PATH))
        .and(body_json(json!({ "asin": "B0BROKEN" })))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let results = scraper(&server, 5, 100)
        .run(&asins(&["B0GOOD1", "B0BROKEN", "B0GOOD2", "B0GOOD3"]))
        .await;

    assert_eq!(results.len(), 4);
    let failed: Vec<&str> = results
        .iter()
        .filter(|r| r.is_failed())
        .map(|r| r.asin.as_str())
        .collect();
    assert_eq!(failed, vec!["B0BROKEN"]);
}

#[tokio::test]
async fn duplicate_inputs_are_processed_independently() {
    let server = MockServer::start().await;
    mount_page(&server, "B0MULTI", MULTIPLE_PARTIES).await;

    let results = scraper(&server, 5, 100)
        .run(&asins(&["B0MULTI", "B0MULTI"]))
        .await;

    assert_eq!(results.len(), 2);
    for result in &results {
        assert_eq!(result.manufacturer.len(), 2);
        assert_eq!(result.manufacturer[0].name, "First Manufacturing Ltd");
        assert_eq!(result.manufacturer[1].name, "Second Manufacturing Co");
    }
}

#[tokio::test]
async fn run_batches_splits_input_by_batch_size() {
    let server = MockServer::start().await;
    let inputs = ["B0A1", "B0A2", "B0A3", "B0A4", "B0A5"];
    for asin in inputs {
        mount_page(&server, asin, TWO_SECTIONS).await;
    }

    let outcomes = scraper(&server, 5, 2).run_batches(asins(&inputs)).await;

    let sizes: Vec<usize> = outcomes.iter().map(|o| o.requested).collect();
    assert_eq!(sizes, vec![2, 2, 1]);
    let indexes: Vec<usize> = outcomes.iter().map(|o| o.index).collect();
    assert_eq!(indexes, vec![0, 1, 2]);
    assert!(outcomes.iter().all(asindb_scraper::BatchOutcome::succeeded));
    let total: usize = outcomes.iter().map(|o| o.results.len()).sum();
    assert_eq!(total, 5);
}

#[tokio::test]
async fn failures_in_one_batch_do_not_block_the_next() {
    let server = MockServer::start().await;
    mount_page(&server, "B0LATER", TWO_SECTIONS).await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT_PATH))
        .and(body_json(json!({ "asin": "B0FIRST" })))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let outcomes = scraper(&server, 5, 1)
        .run_batches(asins(&["B0FIRST", "B0LATER"]))
        .await;

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].failed_count(), 1);
    assert_eq!(outcomes[1].failed_count(), 0);
    assert_eq!(outcomes[1].successful_results().count(), 1);
}

#[tokio::test]
async fn inter_request_delay_spaces_concurrent_starts() {
    let server = MockServer::start().await;
    let inputs = ["B0D1", "B0D2", "B0D3", "B0D4"];
    for asin in inputs {
        mount_page(&server, asin, TWO_SECTIONS).await;
    }

    let started = Instant::now();
    let results = scraper_with_delay(&server, 5, 100, 200)
        .run(&asins(&inputs))
        .await;
    let elapsed = started.elapsed();

    assert_eq!(results.len(), 4);
    // Four starts 200 ms apart: the last cannot begin before 600 ms even
    // though all four fit in the concurrency limit.
    assert!(
        elapsed >= Duration::from_millis(600),
        "requests were not spaced: finished after {elapsed:?}"
    );
}
