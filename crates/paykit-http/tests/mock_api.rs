//! HTTP-level tests for the client over reqwest.
//!
//! These tests use wiremock to simulate the backend and exercise the real
//! transport end to end.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use paykit_core::error::{AuthError, RefreshFailure, TransportError};
use paykit_core::{ApiRequest, ApiUrl, CredentialPair, CredentialStore, Credentials, Error};
use paykit_http::{AuthenticatedClient, ClientConfig};
use paykit_store::MemoryCredentialStore;

/// Helper to create an API URL from a mock server.
fn mock_api_url(server: &MockServer) -> ApiUrl {
    ApiUrl::new(format!("http://127.0.0.1:{}", server.address().port())).unwrap()
}

fn client(
    server: &MockServer,
    store: Arc<MemoryCredentialStore>,
) -> AuthenticatedClient {
    AuthenticatedClient::with_reqwest(ClientConfig::new(mock_api_url(server)), store).unwrap()
}

fn seeded_store() -> Arc<MemoryCredentialStore> {
    Arc::new(MemoryCredentialStore::with_pair(&CredentialPair::new(
        "old-access-token",
        "refresh-token",
    )))
}

/// Mount `GET /cards`: 200 for the fresh token, 401 otherwise.
async fn mount_cards(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/cards"))
        .and(header("authorization", "Bearer new-access-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cards": [{ "last4": "4242" }]
        })))
        .with_priority(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cards"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "ExpiredToken",
            "message": "Token has expired"
        })))
        .with_priority(10)
        .mount(server)
        .await;
}

// ============================================================================
// Refresh
// ============================================================================

#[tokio::test]
async fn test_concurrent_requests_share_one_refresh() {
    let server = MockServer::start().await;
    mount_cards(&server).await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(json!({ "refresh_token": "refresh-token" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": "new-access-token" }))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = seeded_store();
    let client = client(&server, store.clone());

    let results =
        join_all((0..5).map(|_| client.get_json::<serde_json::Value>("/cards"))).await;

    for result in results {
        assert_eq!(result.unwrap()["cards"][0]["last4"], "4242");
    }
    assert!(!client.is_refreshing());

    let pair = store.load_pair().await.unwrap().unwrap();
    assert_eq!(pair.access_token.as_str(), "new-access-token");
    assert_eq!(pair.refresh_token.as_str(), "refresh-token");

    // The refresh call is unauthenticated.
    let requests = server.received_requests().await.unwrap();
    let refreshes: Vec<_> = requests
        .iter()
        .filter(|r| r.url.path() == "/auth/refresh")
        .collect();
    assert_eq!(refreshes.len(), 1);
    assert!(!refreshes[0].headers.contains_key("authorization"));
}

#[tokio::test]
async fn test_refresh_rejected_ends_session() {
    let server = MockServer::start().await;
    mount_cards(&server).await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "ExpiredToken",
            "message": "Refresh token has expired"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = seeded_store();
    let client = client(&server, store.clone());

    let err = client.request(ApiRequest::get("/cards")).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Auth(AuthError::SessionExpired(RefreshFailure::Rejected { status: 400 }))
    ));
    assert!(store.load_pair().await.unwrap().is_none());
}

#[tokio::test]
async fn test_refresh_ok_without_access_token_ends_session() {
    let server = MockServer::start().await;
    mount_cards(&server).await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let store = seeded_store();
    let client = client(&server, store.clone());

    let err = client.request(ApiRequest::get("/cards")).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Auth(AuthError::SessionExpired(RefreshFailure::MissingAccessToken))
    ));
    assert!(!client.has_session().await.unwrap());
}

// ============================================================================
// Pass-through behavior
// ============================================================================

#[tokio::test]
async fn test_server_error_passes_through() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/transactions"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_string("Internal Server Error")
                .insert_header("content-type", "text/plain"),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let store = seeded_store();
    let client = client(&server, store.clone());

    let err = client
        .request(ApiRequest::get("/transactions"))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert!(err.to_string().contains("500"));
    assert!(store.load_pair().await.unwrap().is_some());
}

#[tokio::test]
async fn test_timeout_is_a_transport_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/transactions"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let store = seeded_store();
    let config = ClientConfig::new(mock_api_url(&server))
        .with_request_timeout(Duration::from_millis(200));
    let client = AuthenticatedClient::with_reqwest(config, store.clone()).unwrap();

    let err = client
        .request(ApiRequest::get("/transactions"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Transport(TransportError::Timeout { duration_ms: 200 })
    ));
    assert!(store.load_pair().await.unwrap().is_some());
}

#[tokio::test]
async fn test_request_sends_query_headers_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/autopay/rules"))
        .and(query_param("dry_run", "true"))
        .and(header("authorization", "Bearer old-access-token"))
        .and(header("x-device-id", "device-7"))
        .and(body_json(json!({ "merchant": "m-1", "limit": 5000 })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "rule-1" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, seeded_store());

    let response = client
        .request(
            ApiRequest::post("/autopay/rules")
                .query("dry_run", "true")
                .header("X-Device-Id", "device-7")
                // Replaced by the stored token.
                .header("Authorization", "Bearer caller-supplied")
                .json(&json!({ "merchant": "m-1", "limit": 5000 }))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status, 201);
    assert_eq!(response.json::<serde_json::Value>().unwrap()["id"], "rule-1");
}

#[tokio::test]
async fn test_no_stored_token_sends_no_authorization() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/public/merchants"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = client(&server, Arc::new(MemoryCredentialStore::new()));
    let merchants: Vec<serde_json::Value> = client.get_json("/public/merchants").await.unwrap();

    assert!(merchants.is_empty());
    let requests = server.received_requests().await.unwrap();
    assert!(!requests[0].headers.contains_key("authorization"));
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_stores_token_pair() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({
            "identifier": "alice@example.com",
            "password": "secret123"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "login-access",
            "refresh_token": "login-refresh"
        })))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let client = client(&server, store.clone());

    client
        .login(&Credentials::new("alice@example.com", "secret123"))
        .await
        .unwrap();

    assert_eq!(
        store.load_pair().await.unwrap(),
        Some(CredentialPair::new("login-access", "login-refresh"))
    );
    assert!(client.has_session().await.unwrap());
}

#[tokio::test]
async fn test_login_invalid_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "InvalidCredentials",
            "message": "Invalid identifier or password"
        })))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let client = client(&server, store.clone());

    let err = client
        .login(&Credentials::new("bad@user", "wrongpass"))
        .await
        .unwrap_err();

    match err {
        Error::Auth(AuthError::InvalidCredentials(message)) => {
            assert_eq!(message, "Invalid identifier or password")
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(store.load_pair().await.unwrap().is_none());
}

#[tokio::test]
async fn test_login_malformed_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "x" })))
        .mount(&server)
        .await;

    let client = client(&server, Arc::new(MemoryCredentialStore::new()));
    let err = client
        .login(&Credentials::new("alice@example.com", "secret123"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Decode { .. }));
}
