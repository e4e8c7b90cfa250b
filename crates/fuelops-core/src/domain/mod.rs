//! Domain entities and business logic
//!
//! This module contains the core domain types for FuelOps:
//! - Newtypes for identifiers, site keys and coordinates
//! - Driver identity (profile and credential record)
//! - Tasks, their lifecycle and completion entries
//! - Notifications and read markers
//! - Password hashing shared by login and registration
//! - Domain-specific error types

pub mod directions;
pub mod driver;
pub mod errors;
pub mod newtypes;
pub mod notification;
pub mod password;
pub mod profile;
pub mod push;
pub mod task;
pub mod task_entry;
pub mod timestamp;

// Re-export commonly used types
pub use driver::{DriverRecord, NewDriver};
pub use errors::{AuthError, DomainError, MutationError, UploadError};
pub use newtypes::*;
pub use notification::{Notification, NotificationReadMarker};
pub use profile::DriverProfile;
pub use push::PushRegistration;
pub use task::{Task, TaskStatus, TaskTimestamps, RETURNED_TO_DRIVER};
pub use task_entry::TaskEntry;
pub use timestamp::{parse_timestamp, TimestampField};
