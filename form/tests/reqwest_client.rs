//! `ReqwestHttpClient` against a mock server.

#![allow(clippy::expect_used, clippy::unwrap_used)] // Test code can use unwrap/expect

use dynform::ReqwestHttpClient;
use dynform_core::environment::{HttpClient, TransportError};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ReqwestHttpClient {
    ReqwestHttpClient::new(Url::parse(&server.uri()).unwrap())
}

#[tokio::test]
async fn test_get_resolves_paths_against_base_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forms/contact.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"data":[]}"#))
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server)
        .get("/forms/contact.json".to_string())
        .await
        .unwrap();

    assert!(response.is_success());
    assert_eq!(response.body, r#"{"data":[]}"#);
}

#[tokio::test]
async fn test_post_sends_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/sub"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"data": {"email": "a@example.com"}})))
        .respond_with(ResponseTemplate::new(201).set_body_string("created"))
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server)
        .post_json(
            "/api/sub".to_string(),
            json!({"data": {"email": "a@example.com"}}),
        )
        .await
        .unwrap();

    assert_eq!(response.status, 201);
    assert_eq!(response.body, "created");
}

#[tokio::test]
async fn test_error_statuses_are_responses_not_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/sub"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad field"))
        .mount(&server)
        .await;

    let response = client_for(&server)
        .post_json("/api/sub".to_string(), json!({"data": {}}))
        .await
        .unwrap();

    assert!(!response.is_success());
    assert_eq!(response.status, 400);
    assert_eq!(response.body, "bad field");
}

#[tokio::test]
async fn test_unresolvable_target_is_a_transport_error() {
    let client = ReqwestHttpClient::new(Url::parse("http://localhost/").unwrap());

    let error = client.get("http://[::1".to_string()).await.unwrap_err();

    assert!(matches!(error, TransportError::InvalidUrl { .. }));
}

#[tokio::test]
async fn test_unreachable_server_is_a_transport_error() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    drop(server);

    let error = client.get("/forms/contact.json".to_string()).await.unwrap_err();

    assert!(matches!(error, TransportError::RequestFailed(_)));
}
