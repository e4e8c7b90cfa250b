//! Realtime stream consumption

use std::{sync::Arc, time::Duration};

use fuelops_backend::{BackendClient, HttpRealtimeFeed};
use fuelops_core::{
    domain::{TaskId, TaskStatus},
    ports::{IRealtimeFeed, TaskEvent},
};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common;

const STREAM: &str = concat!(
    ": connected\n\n",
    "data: {\"type\":\"INSERT\",\"table\":\"driver_tasks\",\"record\":{\"id\":11,\"driver_name\":\"Irfan\"}}\n\n",
    "data: not json\n\n",
    "data: {\"eventType\":\"update\",\"new\":{\"id\":11,\"driver_name\":\"Irfan\",\"status\":\"in_progress\"},\"old\":{}}\n\n",
    "data: {\"type\":\"DELETE\",\"old_record\":{\"id\":11}}\n\n",
);

async fn setup_stream() -> (MockServer, HttpRealtimeFeed) {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/realtime/v1/changes"))
        .and(query_param("table", "driver_tasks"))
        .and(query_param(
            "or",
            "(driver_name.ilike.\"Irfan\",driver_phone.eq.\"566041714\")",
        ))
        .and(header("accept", "text/event-stream"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(STREAM),
        )
        .mount(&server)
        .await;

    let client = Arc::new(BackendClient::new(server.uri(), common::ANON_KEY));
    let endpoint = format!("{}/realtime/v1/changes", server.uri());
    let feed = HttpRealtimeFeed::new(client, endpoint, 16)
        .with_backoff(Duration::from_millis(10), Duration::from_millis(40));
    (server, feed)
}

async fn next_event(rx: &mut tokio::sync::mpsc::Receiver<TaskEvent>) -> TaskEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("feed closed")
}

#[tokio::test]
async fn test_stream_decodes_both_frame_shapes() {
    let (_server, feed) = setup_stream().await;
    let shutdown = CancellationToken::new();
    let mut rx = feed.subscribe(&common::irfan(), shutdown.clone()).await.unwrap();

    assert!(matches!(next_event(&mut rx).await, TaskEvent::Inserted(t) if t.id() == TaskId::new(11)));
    assert!(matches!(
        next_event(&mut rx).await,
        TaskEvent::Updated(t) if t.status() == TaskStatus::InProgress
    ));
    assert!(matches!(next_event(&mut rx).await, TaskEvent::Deleted(d) if d.id == TaskId::new(11)));

    shutdown.cancel();
}

#[tokio::test]
async fn test_stream_reconnects_after_close() {
    let (server, feed) = setup_stream().await;
    let shutdown = CancellationToken::new();
    let mut rx = feed.subscribe(&common::irfan(), shutdown.clone()).await.unwrap();

    // Six events means the second connection delivered as well.
    for _ in 0..6 {
        next_event(&mut rx).await;
    }
    assert!(server.received_requests().await.unwrap().len() >= 2);
    shutdown.cancel();
}

#[tokio::test]
async fn test_cancel_closes_the_channel() {
    let (_server, feed) = setup_stream().await;
    let shutdown = CancellationToken::new();
    let mut rx = feed.subscribe(&common::irfan(), shutdown.clone()).await.unwrap();

    next_event(&mut rx).await;
    shutdown.cancel();

    let drained = tokio::time::timeout(Duration::from_secs(5), async {
        while rx.recv().await.is_some() {}
    })
    .await;
    assert!(drained.is_ok(), "feed kept running after cancel");
}

#[tokio::test]
async fn test_unreachable_endpoint_keeps_retrying_until_cancel() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = Arc::new(BackendClient::new(server.uri(), common::ANON_KEY));
    let feed = HttpRealtimeFeed::new(client, format!("{}/realtime/v1/changes", server.uri()), 4)
        .with_backoff(Duration::from_millis(5), Duration::from_millis(20));
    let shutdown = CancellationToken::new();
    let mut rx = feed.subscribe(&common::irfan(), shutdown.clone()).await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(server.received_requests().await.unwrap().len() >= 2);

    shutdown.cancel();
    let closed = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await;
    assert!(matches!(closed, Ok(None)));
}
