//! End-to-end happy path across all four services.
//!
//! Every service runs in-process on an ephemeral port with an in-memory
//! store. Labeling and aggregation talk to the real serialization server;
//! only the external system is faked.
//!
//! 1. Allocate two serials
//! 2. Print both labels (serials move to PRINTED)
//! 3. Scan both (serials move to SCANNED)
//! 4. Aggregate them into a carton
//! 5. Push the carton to the external system
//!
//! ## Running
//!
//! ```bash
//! cargo test -p unitrace-e2e --test happy_path
//! ```

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{json, Value};
use unitrace_testing::{init_tracing, TestServer};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Stack {
    serialization: TestServer,
    labeling: TestServer,
    aggregation: TestServer,
    integration: TestServer,
    external: MockServer,
    client: reqwest::Client,
}

impl Stack {
    async fn start() -> Self {
        init_tracing();

        let allocator = unitrace_serialization::allocator::Allocator::new(
            Arc::new(unitrace_serialization::store::MemoryIdentifierStore::new()),
            unitrace_serialization::allocator::AllocationStrategy::Counter,
        );
        allocator.prime().await.unwrap();
        let serialization = TestServer::spawn(unitrace_serialization::api::create_router(
            unitrace_serialization::state::AppState::new(allocator),
        ))
        .await;

        let updater = unitrace_labeling::status_client::HttpStatusUpdater::new(
            serialization.base_url.clone(),
            Duration::from_secs(2),
        )
        .unwrap();
        let (side_effects, _failures) = unitrace_labeling::side_effects::SideEffects::channel();
        let labeler = unitrace_labeling::labeler::Labeler::new(
            Arc::new(unitrace_labeling::store::MemoryLabelStore::new()),
            Arc::new(updater),
            side_effects,
        );
        let labeling = TestServer::spawn(unitrace_labeling::api::create_router(
            unitrace_labeling::state::AppState::new(labeler),
        ))
        .await;

        let validator = unitrace_aggregation::validator::HttpSerialValidator::new(
            serialization.base_url.clone(),
            Duration::from_secs(2),
        )
        .unwrap();
        let coordinator = unitrace_aggregation::coordinator::Coordinator::new(
            Arc::new(unitrace_aggregation::store::MemoryContainerStore::new()),
            Arc::new(validator),
        );
        let aggregation = TestServer::spawn(unitrace_aggregation::api::create_router(
            unitrace_aggregation::state::AppState::new(coordinator),
        ))
        .await;

        let external = MockServer::start().await;
        let deliverer = unitrace_integration::delivery::Deliverer::new(
            format!("{}/epcis", external.uri()),
            unitrace_integration::delivery::RetryPolicy::default(),
            Arc::new(unitrace_integration::delivery::RecordingSleeper::new()),
        )
        .unwrap();
        let integration = TestServer::spawn(unitrace_integration::api::create_router(
            unitrace_integration::state::AppState::new(deliverer),
        ))
        .await;

        Self {
            serialization,
            labeling,
            aggregation,
            integration,
            external,
            client: reqwest::Client::new(),
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> (StatusCode, Value) {
        let resp = request.send().await.unwrap();
        (resp.status(), resp.json().await.unwrap())
    }

    async fn status_of(&self, serial: &str) -> Value {
        let (_, body) = self
            .send(self.client.get(self.serialization.url("/all")))
            .await;
        body.as_array()
            .unwrap()
            .iter()
            .find(|r| r["serial"] == serial)
            .map(|r| r["status"].clone())
            .unwrap()
    }

    /// Label status updates are asynchronous; poll until one lands.
    async fn wait_for_status(&self, serial: &str, expected: &str) {
        for _ in 0..50 {
            if self.status_of(serial).await == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("{serial} never reached {expected}");
    }
}

#[tokio::test]
async fn test_unit_lifecycle_through_all_services() {
    let stack = Stack::start().await;

    // 1. Allocate
    let mut serials = Vec::new();
    let mut payloads = Vec::new();
    for _ in 0..2 {
        let (status, body) = stack
            .send(
                stack
                    .client
                    .post(stack.serialization.url("/generate"))
                    .json(&json!({
                        "productCode": "09506000134352",
                        "batch": "LOT-42",
                        "manufactureDate": "2025-01-01",
                        "expiryDate": "2027-01-01"
                    })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        serials.push(body["serial"].as_str().unwrap().to_string());
        payloads.push(body["labelPayload"].as_str().unwrap().to_string());
    }
    assert_eq!(serials, vec!["10000001", "10000002"]);

    // 2. Print
    for (serial, payload) in serials.iter().zip(&payloads) {
        let (status, body) = stack
            .send(
                stack
                    .client
                    .post(stack.labeling.url("/print"))
                    .json(&json!({ "labelPayload": payload })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["serial"], serial.as_str());
        stack.wait_for_status(serial, "PRINTED").await;
    }

    // 3. Scan
    for serial in &serials {
        let (status, body) = stack
            .send(
                stack
                    .client
                    .patch(stack.serialization.url(&format!("/status/{serial}")))
                    .json(&json!({ "status": "SCANNED" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "SCANNED");
    }

    let (_, stats) = stack
        .send(stack.client.get(stack.serialization.url("/stats")))
        .await;
    assert_eq!(stats["scanned"], 2);
    assert_eq!(stats["pending"], 0);

    // 4. Aggregate
    let (status, body) = stack
        .send(
            stack
                .client
                .post(stack.aggregation.url("/aggregate"))
                .json(&json!({ "containerId": "CARTON-1", "members": serials })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["memberCount"], 2);

    let (status, body) = stack
        .send(
            stack
                .client
                .post(stack.aggregation.url("/aggregate"))
                .json(&json!({ "containerId": "CARTON-2", "members": ["99999999"] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Serial 99999999 does not exist");

    let (_, carton) = stack
        .send(stack.client.get(stack.aggregation.url("/aggregation/CARTON-1")))
        .await;

    // 5. Push
    Mock::given(method("POST"))
        .and(path("/epcis"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&stack.external)
        .await;

    let (status, body) = stack
        .send(
            stack
                .client
                .post(stack.integration.url("/push"))
                .json(&carton),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "POSTED");
    assert_eq!(body["upstreamStatus"], 202);
    assert_eq!(body["attempts"], 1);

    let received = stack.external.received_requests().await.unwrap();
    let pushed: Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(pushed["containerId"], "CARTON-1");
}
