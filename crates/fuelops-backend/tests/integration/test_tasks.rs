//! Task reads, updates, entries and site lookups

use chrono::{TimeZone, Utc};
use fuelops_core::{
    domain::{SiteKey, TaskEntry, TaskId, TaskStatus},
    ports::{IBackendService, ISiteDirectory, TaskPatch},
};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

#[tokio::test]
async fn test_fetch_tasks_filters_by_name_or_phone() {
    let (server, _client, backend) = common::setup_backend().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/driver_tasks"))
        .and(query_param(
            "or",
            "(driver_name.ilike.\"Irfan\",driver_phone.eq.\"566041714\")",
        ))
        .and(query_param("order", "scheduled_at.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": 11, "driver_name": "Irfan", "status": "pending", "site_id": "42"},
            {"id": "12", "driver_phone": 566041714, "status": "Completed",
             "completed_at": "2026-03-01T08:00:00Z"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let tasks = backend.fetch_tasks(&common::irfan()).await.unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].site_id(), Some("42"));
    assert_eq!(tasks[1].id(), TaskId::new(12));
    assert_eq!(tasks[1].status(), TaskStatus::Completed);
}

#[tokio::test]
async fn test_update_task_patches_by_id() {
    let (server, _client, backend) = common::setup_backend().await;
    let at = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/driver_tasks"))
        .and(query_param("id", "eq.11"))
        .and(body_json(serde_json::json!({
            "status": "completed",
            "completed_at": "2026-03-01T08:00:00Z"
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let patch = TaskPatch::status(TaskStatus::Completed).with_completed_at(at);
    backend.update_task(TaskId::new(11), &patch).await.unwrap();
}

#[tokio::test]
async fn test_update_task_server_error_surfaces() {
    let (server, _client, backend) = common::setup_backend().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/driver_tasks"))
        .respond_with(
            ResponseTemplate::new(400).set_body_string("column \"completed_at\" does not exist"),
        )
        .mount(&server)
        .await;

    let patch = TaskPatch::status(TaskStatus::InProgress);
    let err = backend.update_task(TaskId::new(11), &patch).await.unwrap_err();
    assert!(format!("{err:#}").contains("Failed to update task 11"));
}

#[tokio::test]
async fn test_insert_task_entry() {
    let (server, _client, backend) = common::setup_backend().await;
    let at = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();

    Mock::given(method("POST"))
        .and(path("/rest/v1/driver_task_entries"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let entry = TaskEntry::new(TaskId::new(11), &common::irfan(), 1500.0, at).unwrap();
    backend.insert_task_entry(&entry).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["task_id"], 11);
    assert_eq!(body["driver_name"], "Irfan");
    assert_eq!(body["quantity"], 1500.0);
}

#[tokio::test]
async fn test_site_lookups_are_batched() {
    let (server, _client, backend) = common::setup_backend().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/sites"))
        .and(query_param("id", "in.(\"42\",\"7\")"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": 42, "name": "North Depot", "latitude": 24.1, "longitude": 46.2}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/sites"))
        .and(query_param(
            "or",
            "(name.ilike.\"north depot\",name.ilike.\"east\\\\_yard\")",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": 42, "name": "North Depot", "latitude": "24.1", "longitude": "46.2"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let ids = [SiteKey::new("42").unwrap(), SiteKey::new("7").unwrap()];
    let by_id = backend.lookup_by_ids(&ids).await.unwrap();
    assert_eq!(by_id.len(), 1);
    assert_eq!(by_id[0].id.as_deref(), Some("42"));

    let names = [
        SiteKey::new("North Depot").unwrap(),
        SiteKey::new("East_Yard").unwrap(),
    ];
    let by_name = backend.lookup_by_names(&names).await.unwrap();
    assert_eq!(by_name[0].coordinates.unwrap().latitude(), 24.1);

    assert!(backend.lookup_by_ids(&[]).await.unwrap().is_empty());
}
