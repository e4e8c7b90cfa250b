//! Notifications, read markers and push tokens

use chrono::{TimeZone, Utc};
use fuelops_core::{
    domain::{NotificationReadMarker, PushRegistration},
    ports::IBackendService,
};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

#[tokio::test]
async fn test_fetch_notifications_includes_broadcasts() {
    let (server, _client, backend) = common::setup_backend().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/driver_notifications"))
        .and(query_param("or", "(driver_name.is.null,driver_name.ilike.\"Irfan\")"))
        .and(query_param("order", "created_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": 2, "title": "Route change", "message": "Use gate B", "driver_name": "Irfan",
             "created_at": "2026-03-02T00:00:00Z"},
            {"id": 1, "title": "Fuel price", "message": "Updated", "driver_name": null,
             "created_at": "2026-03-01T00:00:00Z"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let notifications = backend.fetch_notifications(&common::irfan()).await.unwrap();
    assert_eq!(notifications.len(), 2);
    assert!(!notifications[0].is_broadcast());
    assert!(notifications[1].is_broadcast());
}

#[tokio::test]
async fn test_read_markers_round_trip_through_upsert() {
    let (server, _client, backend) = common::setup_backend().await;
    let driver = common::irfan();
    let at = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();

    Mock::given(method("POST"))
        .and(path("/rest/v1/driver_notification_reads"))
        .and(query_param("on_conflict", "notification_id,driver_name"))
        .and(header("prefer", "resolution=merge-duplicates"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/driver_notification_reads"))
        .and(query_param("driver_name", "eq.Irfan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"notification_id": 1, "driver_name": "Irfan", "read_at": "2026-03-01T08:00:00Z"},
            {"notification_id": null, "driver_name": "Irfan"}
        ])))
        .mount(&server)
        .await;

    let markers = vec![NotificationReadMarker::new(1, &driver, at)];
    backend.mark_notifications_read(&markers).await.unwrap();
    backend.mark_notifications_read(&[]).await.unwrap();

    let stored = backend.fetch_read_markers(&driver).await.unwrap();
    assert_eq!(stored, markers);
}

#[tokio::test]
async fn test_push_token_upsert_on_token() {
    let (server, _client, backend) = common::setup_backend().await;
    let at = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();

    Mock::given(method("POST"))
        .and(path("/rest/v1/driver_push_tokens"))
        .and(query_param("on_conflict", "token"))
        .and(header("prefer", "resolution=merge-duplicates"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let registration = PushRegistration::new("tok-1", &common::irfan(), "Linux", at).unwrap();
    backend.upsert_push_token(&registration).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["platform"], "linux");
    assert_eq!(body["token"], "tok-1");
}
