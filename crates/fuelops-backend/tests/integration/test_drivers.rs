//! Driver lookups and registration

use fuelops_core::{
    domain::{DriverId, NewDriver},
    ports::IBackendService,
};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

#[tokio::test]
async fn test_find_driver_by_id_sends_auth_and_filter() {
    let (server, _client, backend) = common::setup_backend().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/drivers"))
        .and(query_param("id", "eq.7"))
        .and(query_param("limit", "1"))
        .and(header("apikey", common::ANON_KEY))
        .and(header("authorization", "Bearer test-anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": 7, "name": "Irfan", "phone": "566041714", "active": true}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let driver = backend
        .find_driver_by_id(DriverId::new(7))
        .await
        .expect("lookup failed")
        .expect("driver missing");
    assert_eq!(driver.name(), "Irfan");
}

#[tokio::test]
async fn test_find_driver_by_id_absent() {
    let (server, _client, backend) = common::setup_backend().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/drivers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    assert!(backend
        .find_driver_by_id(DriverId::new(566041714))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_search_drivers_uses_or_filter_and_order() {
    let (server, _client, backend) = common::setup_backend().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/drivers"))
        .and(query_param(
            "or",
            "(name.ilike.\"irfan@example.com\",email.ilike.\"irfan@example.com\",phone.ilike.\"irfan@example.com\")",
        ))
        .and(query_param("order", "created_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": 9, "name": "Irfan", "phone": "1", "created_at": "2026-03-02T00:00:00Z"},
            {"id": 3, "name": "Irfan", "phone": "1", "created_at": "2026-01-02T00:00:00Z"},
            {"name": "row without id"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let found = backend.search_drivers("irfan@example.com").await.unwrap();
    let ids: Vec<i64> = found.iter().map(|d| d.id().value()).collect();
    assert_eq!(ids, vec![9, 3]);
}

#[tokio::test]
async fn test_create_driver_returns_stored_row() {
    let (server, _client, backend) = common::setup_backend().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/drivers"))
        .and(header("prefer", "return=representation"))
        .and(body_partial_json(serde_json::json!({
            "name": "Bilal",
            "phone": "555",
            "active": true
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([
            {"id": 21, "name": "Bilal", "phone": "555", "active": true}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let new_driver = NewDriver::new("Bilal", "555", None, "secret").unwrap();
    let stored = backend.create_driver(&new_driver).await.unwrap();
    assert_eq!(stored.id(), DriverId::new(21));
}

#[tokio::test]
async fn test_create_driver_conflict_is_an_error() {
    let (server, _client, backend) = common::setup_backend().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/drivers"))
        .respond_with(ResponseTemplate::new(409).set_body_string("duplicate key value"))
        .mount(&server)
        .await;

    let new_driver = NewDriver::new("Bilal", "555", None, "secret").unwrap();
    let err = backend.create_driver(&new_driver).await.unwrap_err();
    assert!(format!("{err:#}").contains("duplicate key value"));
}
