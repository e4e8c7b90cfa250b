//! 429 handling

use std::sync::Arc;

use fuelops_backend::{BackendClient, BackendError, RestBackend};
use fuelops_core::ports::IBackendService;
use reqwest::Method;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common;

#[tokio::test]
async fn test_retries_after_429_then_succeeds() {
    let (server, _client, backend) = common::setup_backend().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/driver_tasks"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/driver_tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": 1, "driver_name": "Irfan"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let tasks = backend.fetch_tasks(&common::irfan()).await.unwrap();
    assert_eq!(tasks.len(), 1);
}

#[tokio::test]
async fn test_retry_budget_exhausted() {
    let server = MockServer::start().await;
    let client = BackendClient::new(server.uri(), common::ANON_KEY).with_max_retries(1);

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .expect(2)
        .mount(&server)
        .await;

    let err = client
        .execute_with_retry(client.request(Method::GET, "/rest/v1/sites"))
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::TooManyRequests { .. }));
}

#[tokio::test]
async fn test_unauthorized_is_not_retried() {
    let server = MockServer::start().await;
    let client = Arc::new(BackendClient::new(server.uri(), "wrong-key"));
    let backend = RestBackend::new(Arc::clone(&client), common::BUCKET);

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
        .expect(1)
        .mount(&server)
        .await;

    let err = backend.fetch_tasks(&common::irfan()).await.unwrap_err();
    let backend_err = err.downcast_ref::<BackendError>().expect("typed error");
    assert!(matches!(backend_err, BackendError::Unauthorized(m) if m == "Invalid API key"));
}
