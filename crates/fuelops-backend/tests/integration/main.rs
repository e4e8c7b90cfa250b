//! Integration tests for fuelops-backend
//!
//! Uses wiremock to stand in for the hosted backend and verifies the REST
//! queries, upserts, uploads and the realtime stream end to end.

mod common;

mod test_drivers;
mod test_notifications;
mod test_realtime;
mod test_retry;
mod test_storage;
mod test_tasks;
