//! HTTP source behavior against a mock server: retry classification,
//! attempt budgets, and body decoding.

use pretty_assertions::assert_eq;
use profilesmith_core::FetchError;
use profilesmith_core::HttpSource;
use profilesmith_core::config::RetryConfig;
use profilesmith_core::source::fetch_with_retry;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::method;
use wiremock::matchers::path;

fn retry3() -> RetryConfig {
    RetryConfig {
        max_attempts: 3,
        base_delay_ms: 1,
    }
}

#[tokio::test]
async fn test_not_found_costs_exactly_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wifi.json"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let source = HttpSource::new(server.uri(), Duration::from_secs(5));
    let err = fetch_with_retry(&source, "wifi", &retry3(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err, FetchError::Status { code: 404 });
    server.verify().await;
}

#[tokio::test]
async fn test_server_errors_retry_to_the_attempt_budget() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wifi.json"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let source = HttpSource::new(server.uri(), Duration::from_secs(5));
    let err = fetch_with_retry(&source, "wifi", &retry3(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err, FetchError::Status { code: 503 });
    server.verify().await;
}

#[tokio::test]
async fn test_transient_failure_then_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wifi.json"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wifi.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "topicSections": [],
            "references": {}
        })))
        .mount(&server)
        .await;

    let source = HttpSource::new(server.uri(), Duration::from_secs(5));
    let doc = fetch_with_retry(&source, "wifi", &retry3(), &CancellationToken::new())
        .await
        .unwrap();
    assert!(doc.is_structurally_valid());
}

#[tokio::test]
async fn test_malformed_body_is_a_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wifi.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let source = HttpSource::new(server.uri(), Duration::from_secs(5));
    let retry = RetryConfig {
        max_attempts: 1,
        base_delay_ms: 1,
    };
    let err = fetch_with_retry(&source, "wifi", &retry, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Network { .. }));
}

#[tokio::test]
async fn test_cancellation_aborts_the_backoff() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wifi.json"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let source = HttpSource::new(server.uri(), Duration::from_secs(5));
    let retry = RetryConfig {
        max_attempts: 3,
        base_delay_ms: 60_000,
    };
    let cancel = CancellationToken::new();
    cancel.cancel();
    // With the token already cancelled the long backoff never runs.
    let err = fetch_with_retry(&source, "wifi", &retry, &cancel)
        .await
        .unwrap_err();
    assert_eq!(err, FetchError::Timeout);
}
