//! Photo uploads and the dispatch relay

use std::sync::Arc;

use fuelops_backend::HttpDispatchNotifier;
use fuelops_core::{
    domain::TaskId,
    ports::{DispatchMessage, IDispatchNotifier, IFileStorage},
};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

#[tokio::test]
async fn test_upload_returns_public_url() {
    let (server, _client, backend) = common::setup_backend().await;

    Mock::given(method("POST"))
        .and(path("/storage/v1/object/task-photos/Irfan/11/receipt-1-0.jpg"))
        .and(header("content-type", "image/jpeg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Key": "task-photos/Irfan/11/receipt-1-0.jpg"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let url = backend
        .upload("Irfan/11/receipt-1-0.jpg", vec![0xff, 0xd8, 0xff], "image/jpeg")
        .await
        .unwrap();
    assert_eq!(
        url,
        format!(
            "{}/storage/v1/object/public/task-photos/Irfan/11/receipt-1-0.jpg",
            server.uri()
        )
    );

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].body, vec![0xff, 0xd8, 0xff]);
}

#[tokio::test]
async fn test_upload_forbidden_is_an_error() {
    let (server, _client, backend) = common::setup_backend().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("new row violates policy"))
        .mount(&server)
        .await;

    let err = backend
        .upload("Irfan/11/odometer-1-0.png", vec![1], "image/png")
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("Forbidden"));
}

#[tokio::test]
async fn test_dispatch_notifier_posts_json() {
    let (server, client, _backend) = common::setup_backend().await;

    Mock::given(method("POST"))
        .and(path("/api/notify"))
        .and(body_json(serde_json::json!({
            "title": "Task started",
            "message": "Irfan started task 11",
            "task_id": 11,
            "driver_name": "Irfan"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = HttpDispatchNotifier::new(Arc::clone(&client), format!("{}/api/notify", server.uri()));
    let message = DispatchMessage {
        title: "Task started".into(),
        message: "Irfan started task 11".into(),
        task_id: TaskId::new(11),
        driver_name: "Irfan".into(),
    };
    notifier.notify(&message).await.unwrap();
}
