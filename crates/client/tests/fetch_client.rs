//! Integration tests for FetchClient.
//!
//! Uses wiremock for HTTP mocking. Tests cover header forwarding, error
//! statuses passed through as responses, timeouts and connection failures.

use std::time::Duration;

use swcache_client::{FetchClient, FetchConfig, Network, NetworkError};
use swcache_core::Request;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(timeout: Duration) -> FetchClient {
    FetchClient::new(FetchConfig { timeout, ..Default::default() }).expect("failed to create client")
}

fn url(server: &MockServer, p: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), p)).unwrap()
}

#[tokio::test]
async fn test_fetch_success_captures_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/schedule.json"))
        .and(header("accept", "application/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"week":1}"#)
                .insert_header("content-type", "application/json"),
        )
        .mount(&server)
        .await;

    let request = Request::get(url(&server, "/schedule.json")).with_header("Accept", "application/json");
    let response = client(Duration::from_secs(5)).fetch(&request).await.expect("fetch failed");

    assert_eq!(response.status, 200);
    assert_eq!(response.status_text.as_deref(), Some("OK"));
    assert_eq!(response.headers.get("Content-Type"), Some("application/json"));
    assert_eq!(&response.body[..], br#"{"week":1}"#);
}

#[tokio::test]
async fn test_fetch_error_status_is_not_a_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing.png"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let response = client(Duration::from_secs(5))
        .fetch(&Request::get(url(&server, "/missing.png")))
        .await
        .expect("404 should still be a response");

    assert_eq!(response.status, 404);
    assert!(!response.is_ok());
}

#[tokio::test]
async fn test_fetch_sends_method() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/vote"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let request = Request::new("post", url(&server, "/api/vote"));
    let response = client(Duration::from_secs(5)).fetch(&request).await.expect("fetch failed");
    assert_eq!(response.status, 201);
}

#[tokio::test]
async fn test_fetch_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let result = client(Duration::from_millis(200))
        .fetch(&Request::get(url(&server, "/slow")))
        .await;

    assert!(matches!(result, Err(NetworkError::Timeout)), "got {result:?}");
}

#[tokio::test]
async fn test_fetch_connection_refused() {
    let server = MockServer::start().await;
    let target = url(&server, "/gone");
    drop(server);

    let result = client(Duration::from_secs(2)).fetch(&Request::get(target)).await;
    assert!(matches!(result, Err(NetworkError::Transport(_))), "got {result:?}");
}
