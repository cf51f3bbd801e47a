//! Labeling API tests. The serialization service is faked with wiremock.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{json, Value};
use unitrace_labeling::{
    api, labeler::Labeler, side_effects::SideEffects, state::AppState,
    status_client::HttpStatusUpdater, store::MemoryLabelStore,
};
use unitrace_testing::{init_tracing, TestServer};
use wiremock::matchers::{body_json, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    server: TestServer,
    serialization: MockServer,
    client: reqwest::Client,
}

impl Harness {
    async fn new() -> Self {
        init_tracing();
        let serialization = MockServer::start().await;
        let updater = HttpStatusUpdater::new(serialization.uri(), Duration::from_secs(2)).unwrap();
        let (side_effects, _failures) = SideEffects::channel();
        let labeler = Labeler::new(
            Arc::new(MemoryLabelStore::new()),
            Arc::new(updater),
            side_effects,
        );
        let server = TestServer::spawn(api::create_router(AppState::new(labeler))).await;

        Self {
            server,
            serialization,
            client: reqwest::Client::new(),
        }
    }

    async fn print(&self, body: Value) -> (StatusCode, Value) {
        let resp = self
            .client
            .post(self.server.url("/print"))
            .json(&body)
            .send()
            .await
            .unwrap();
        (resp.status(), resp.json().await.unwrap())
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let resp = self.client.get(self.server.url(path)).send().await.unwrap();
        (resp.status(), resp.json().await.unwrap())
    }

    /// Waits for the background status update to reach the fake.
    async fn status_patches(&self, expected: usize) -> Vec<wiremock::Request> {
        for _ in 0..50 {
            let received = self.serialization.received_requests().await.unwrap();
            let patches: Vec<_> = received
                .into_iter()
                .filter(|r| r.method.as_str() == "PATCH")
                .collect();
            if patches.len() >= expected {
                return patches;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("expected {expected} status updates");
    }
}

#[tokio::test]
async fn test_print_marks_serial_printed() {
    let h = Harness::new().await;
    Mock::given(method("PATCH"))
        .and(path("/status/10000001"))
        .and(header_exists("x-request-id"))
        .and(body_json(json!({"status": "PRINTED"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true, "serial": "10000001", "status": "PRINTED"
        })))
        .expect(1)
        .mount(&h.serialization)
        .await;

    let (status, body) = h.print(json!({"labelPayload": "(21)10000001"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["labelPayload"], "(21)10000001");
    assert_eq!(body["serial"], "10000001");
    assert_eq!(body["status"], "PRINTED");
    assert_eq!(body["printCount"], 1);

    let patches = h.status_patches(1).await;
    assert_eq!(patches[0].url.path(), "/status/10000001");
}

#[tokio::test]
async fn test_print_succeeds_when_status_update_fails() {
    let h = Harness::new().await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "Invalid status transition from SCANNED to PRINTED"
        })))
        .mount(&h.serialization)
        .await;

    let (status, body) = h.print(json!({"gs1": "(21)10000001"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["printCount"], 1);
    h.status_patches(1).await;

    let (status, body) = h.get("/labels/10000001").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["labelPayload"], "(21)10000001");
}

#[tokio::test]
async fn test_reprint_counts_prints() {
    let h = Harness::new().await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&h.serialization)
        .await;

    h.print(json!({"labelPayload": "(21)10000001"})).await;
    let (_, body) = h.print(json!({"labelPayload": "(21)10000001"})).await;
    assert_eq!(body["printCount"], 2);

    let (status, body) = h.get("/labels").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_payload_without_serial_is_recorded_only() {
    let h = Harness::new().await;

    let (status, body) = h.print(json!({"labelPayload": "FREE-TEXT"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["serial"], Value::Null);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(h.serialization.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_print_validation() {
    let h = Harness::new().await;

    let (status, body) = h.print(json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Label payload is required");

    let (status, body) = h.print(json!({"labelPayload": 7})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Label payload must be a string");
}

#[tokio::test]
async fn test_unknown_label_is_404() {
    let h = Harness::new().await;
    let (status, body) = h.get("/labels/99999999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Label not found");
}

#[tokio::test]
async fn test_lookup_by_payload() {
    let h = Harness::new().await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&h.serialization)
        .await;
    h.print(json!({"labelPayload": "(01)09506000134352(21)10000001"}))
        .await;

    let resp = h
        .client
        .get(h.server.url("/by-gs1"))
        .query(&[("gs1", "(01)09506000134352(21)10000001")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["serial"], "10000001");
    assert_eq!(body["printCount"], 1);

    let (status, body) = h.get("/by-gs1?gs1=%2821%2999999999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Label not found");

    let (status, body) = h.get("/by-gs1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Label payload is required");
}
