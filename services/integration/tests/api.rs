//! Push API tests against a wiremock external system.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{json, Value};
use unitrace_id::TraceId;
use unitrace_integration::{
    api,
    delivery::{Deliverer, RecordingSleeper, RetryPolicy},
    state::AppState,
};
use unitrace_testing::{init_tracing, TestServer};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    server: TestServer,
    external: MockServer,
    sleeper: Arc<RecordingSleeper>,
    client: reqwest::Client,
}

impl Harness {
    async fn new() -> Self {
        init_tracing();
        let external = MockServer::start().await;
        let sleeper = Arc::new(RecordingSleeper::new());
        let deliverer = Deliverer::new(
            format!("{}/api", external.uri()),
            RetryPolicy::default(),
            sleeper.clone(),
        )
        .unwrap();
        let server = TestServer::spawn(api::create_router(AppState::new(deliverer))).await;

        Self {
            server,
            external,
            sleeper,
            client: reqwest::Client::new(),
        }
    }

    async fn push(&self, body: Value) -> (StatusCode, Value) {
        let resp = self
            .client
            .post(self.server.url("/push"))
            .json(&body)
            .send()
            .await
            .unwrap();
        (resp.status(), resp.json().await.unwrap())
    }
}

#[tokio::test]
async fn test_push_posted() {
    let h = Harness::new().await;
    let event = json!({"eventType": "ObjectEvent", "serial": "10000001"});
    Mock::given(method("POST"))
        .and(path("/api"))
        .and(body_json(&event))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&h.external)
        .await;

    let (status, body) = h.push(event).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "POSTED");
    assert_eq!(body["upstreamStatus"], 200);
    assert!(body["traceId"]
        .as_str()
        .unwrap()
        .parse::<TraceId>()
        .is_ok());
}

#[tokio::test]
async fn test_push_server_error_exhausts_retries() {
    let h = Harness::new().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&h.external)
        .await;

    let (status, body) = h.push(json!({"event": 1})).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["status"], "FAILED");
    assert_eq!(body["upstreamStatus"], 500);
    assert_eq!(body["attempts"], 3);
    assert_eq!(
        h.sleeper.delays(),
        vec![Duration::from_secs(2), Duration::from_secs(4)]
    );
}

#[tokio::test]
async fn test_push_client_error_fails_fast() {
    let h = Harness::new().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(422))
        .expect(1)
        .mount(&h.external)
        .await;

    let (status, body) = h.push(json!({"event": 1})).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["status"], "FAILED");
    assert_eq!(body["upstreamStatus"], 422);
    assert!(h.sleeper.delays().is_empty());
}

#[tokio::test]
async fn test_push_unreachable_is_gateway_timeout() {
    init_tracing();
    let sleeper = Arc::new(RecordingSleeper::new());
    let deliverer = Deliverer::new("http://127.0.0.1:9/api", RetryPolicy::default(), sleeper).unwrap();
    let server = TestServer::spawn(api::create_router(AppState::new(deliverer))).await;

    let resp = reqwest::Client::new()
        .post(server.url("/push"))
        .json(&json!({"event": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "FAILED");
    assert_eq!(body["error"], "External system unreachable");
    assert!(body.get("upstreamStatus").is_none());
}

#[tokio::test]
async fn test_push_rejects_non_objects() {
    let h = Harness::new().await;
    for payload in [json!([1, 2, 3]), json!("event"), json!(null)] {
        let (status, body) = h.push(payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "FAILED");
        assert_eq!(body["kind"], "validation_error");
    }
    assert!(h.external.received_requests().await.unwrap().is_empty());
}
