//! Use cases (interactors) for the FuelOps driver client
//!
//! This module contains the application use cases that orchestrate
//! domain entities and port interfaces. Use cases are thin coordinators
//! that delegate business rules to domain methods and I/O to ports.
//!
//! ## Use Cases
//!
//! - [`AuthenticateUseCase`] - Login, logout, session restore, driver registration
//! - [`TaskActionsUseCase`] - Start, complete and report-issue transitions
//! - [`NotificationsUseCase`] - Inbox listing and read markers
//! - [`PushRegistrationUseCase`] - Deduplicated push token sync

pub mod authenticate;
pub mod notifications;
pub mod push_registration;
pub mod task_actions;

#[cfg(test)]
pub(crate) mod testing;

pub use authenticate::AuthenticateUseCase;
pub use notifications::{Inbox, NotificationsUseCase};
pub use push_registration::{PushRegistrationUseCase, PushSyncOutcome};
pub use task_actions::{CompletionForm, PhotoUpload, TaskActionsUseCase};
