// crates/network/tests/network_tests.rs
//! Integration tests for the service client against a mock HTTP server

use guidesync_core::{RecordKind, RemoteApi, RemoteError, RemoteId};
use guidesync_network::{ClientConfig, RetryPolicy, ServiceClient};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "test-key";

fn client_with(base_url: &str, retry_policy: RetryPolicy) -> ServiceClient {
    let config = ClientConfig {
        timeout: Duration::from_secs(2),
        retry_policy,
        ..Default::default()
    };
    ServiceClient::with_config(base_url, API_KEY, config).expect("Failed to create client")
}

fn client(server: &MockServer) -> ServiceClient {
    client_with(
        &server.uri(),
        RetryPolicy::new(3).with_initial_delay(Duration::from_millis(1)),
    )
}

fn status_of(err: RemoteError) -> (u16, String) {
    match err {
        RemoteError::Status { status, message } => (status, message),
        other => panic!("expected a status error, got {other:?}"),
    }
}

// =============================================================================
// Requests
// =============================================================================

#[tokio::test]
async fn test_get_sends_api_key() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/customformat"))
        .and(header("x-api-key", API_KEY))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "id": 1, "name": "Remux" }])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let records = client(&server)
        .get_records(RecordKind::CustomFormat)
        .await
        .unwrap();
    assert_eq!(records, vec![json!({ "id": 1, "name": "Remux" })]);
}

#[tokio::test]
async fn test_create_posts_to_collection() {
    let server = MockServer::start().await;
    let payload = json!({ "name": "Remux", "specifications": [] });

    Mock::given(method("POST"))
        .and(path("/api/v3/customformat"))
        .and(header("x-api-key", API_KEY))
        .and(body_json(&payload))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 9,
            "name": "Remux",
            "specifications": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let created = client(&server)
        .create_record(RecordKind::CustomFormat, &payload)
        .await
        .unwrap();
    assert_eq!(RemoteId::from_document(&created), Some(RemoteId::from(9)));
}

#[tokio::test]
async fn test_update_and_delete_address_one_record() {
    let server = MockServer::start().await;
    let payload = json!({ "id": 4, "name": "HD", "formatItems": [] });

    Mock::given(method("PUT"))
        .and(path("/api/v3/qualityprofile/4"))
        .and(header("x-api-key", API_KEY))
        .and(body_json(&payload))
        .respond_with(ResponseTemplate::new(202).set_body_json(&payload))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/v3/releaseprofile/12"))
        .and(header("x-api-key", API_KEY))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    client
        .update_record(RecordKind::QualityProfile, &RemoteId::from(4), &payload)
        .await
        .unwrap();
    client
        .delete_record(RecordKind::ReleaseProfile, &RemoteId::from(12))
        .await
        .unwrap();
}

// =============================================================================
// Retry Logic
// =============================================================================

#[tokio::test]
async fn test_read_retried_after_server_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/tag"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v3/tag"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1, "label": "tv" }])))
        .expect(1)
        .mount(&server)
        .await;

    let tags = client(&server).get_records(RecordKind::Tag).await.unwrap();
    assert_eq!(tags.len(), 1);
}

#[tokio::test]
async fn test_read_gives_up_after_max_attempts() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/customformat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(3)
        .mount(&server)
        .await;

    let err = client(&server)
        .get_records(RecordKind::CustomFormat)
        .await
        .unwrap_err();
    assert_eq!(status_of(err), (500, "boom".to_string()));
}

#[tokio::test]
async fn test_client_error_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/customformat"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .get_records(RecordKind::CustomFormat)
        .await
        .unwrap_err();
    assert!(err.is_client_error());
    assert_eq!(status_of(err).0, 401);
}

#[tokio::test]
async fn test_writes_attempted_once() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v3/customformat"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/v3/customformat/3"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v3/customformat/3"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let payload = json!({ "name": "x" });
    let id = RemoteId::from(3);

    let created = client.create_record(RecordKind::CustomFormat, &payload).await;
    assert_eq!(status_of(created.unwrap_err()).0, 503);

    let updated = client
        .update_record(RecordKind::CustomFormat, &id, &payload)
        .await;
    assert_eq!(status_of(updated.unwrap_err()).0, 500);

    let deleted = client.delete_record(RecordKind::CustomFormat, &id).await;
    assert_eq!(status_of(deleted.unwrap_err()).0, 502);
}

// =============================================================================
// Error Responses
// =============================================================================

#[tokio::test]
async fn test_error_body_truncated() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/api/v3/customformat/1"))
        .respond_with(ResponseTemplate::new(400).set_body_string("é".repeat(1000)))
        .mount(&server)
        .await;

    let err = client(&server)
        .update_record(RecordKind::CustomFormat, &RemoteId::from(1), &json!({}))
        .await
        .unwrap_err();
    let (status, message) = status_of(err);
    assert_eq!(status, 400);
    assert_eq!(message.chars().count(), 300);
}

#[tokio::test]
async fn test_empty_error_body_uses_reason_phrase() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v3/customformat/8"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client(&server)
        .delete_record(RecordKind::CustomFormat, &RemoteId::from(8))
        .await
        .unwrap_err();
    assert_eq!(status_of(err), (404, "Not Found".to_string()));
}

#[tokio::test]
async fn test_non_array_listing_is_invalid() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/qualityprofile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1 })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .get_records(RecordKind::QualityProfile)
        .await
        .unwrap_err();
    match err {
        RemoteError::InvalidResponse(reason) => assert!(reason.contains("an object")),
        other => panic!("expected an invalid response, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_json_is_invalid_and_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/customformat"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .get_records(RecordKind::CustomFormat)
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::InvalidResponse(_)));
}

// =============================================================================
// Transport
// =============================================================================

#[tokio::test]
async fn test_unreachable_service_is_transport_error() {
    // Port 1 on loopback refuses connections immediately
    let client = client_with(
        "http://127.0.0.1:1",
        RetryPolicy::new(2).with_initial_delay(Duration::from_millis(1)),
    );

    let read = client.get_records(RecordKind::CustomFormat).await;
    assert!(matches!(read, Err(RemoteError::Transport(_))));

    let written = client
        .create_record(RecordKind::CustomFormat, &json!({ "name": "x" }))
        .await;
    assert!(matches!(written, Err(RemoteError::Transport(_))));
}

#[tokio::test]
async fn test_client_usable_as_trait_object() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/tag"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let api: Box<dyn RemoteApi> = Box::new(client(&server));
    assert!(api.get_records(RecordKind::Tag).await.unwrap().is_empty());
}
