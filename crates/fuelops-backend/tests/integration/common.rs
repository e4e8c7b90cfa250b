//! Shared helpers for backend integration tests

use std::sync::Arc;

use fuelops_backend::{BackendClient, RestBackend};
use fuelops_core::domain::DriverProfile;
use wiremock::MockServer;

pub const ANON_KEY: &str = "test-anon-key";
pub const BUCKET: &str = "task-photos";

/// Starts a mock server and returns an adapter pointed at it
pub async fn setup_backend() -> (MockServer, Arc<BackendClient>, RestBackend) {
    let server = MockServer::start().await;
    let client = Arc::new(BackendClient::new(server.uri(), ANON_KEY));
    let backend = RestBackend::new(Arc::clone(&client), BUCKET);
    (server, client, backend)
}

pub fn irfan() -> DriverProfile {
    DriverProfile::new("Irfan", "566041714").unwrap()
}
