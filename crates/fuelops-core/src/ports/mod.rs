//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IBackendService`] - Tables of the hosted backend (drivers, tasks, entries,
//!   notifications, push tokens)
//! - [`ISiteDirectory`] - Batched site coordinate lookups
//! - [`IFileStorage`] - Completion photo uploads
//! - [`IRealtimeFeed`] - Change feed for `driver_tasks`
//! - [`ILocalStore`] - Durable local state (remembered profile, push signature,
//!   task snapshot)
//! - [`IDispatchNotifier`] - Best-effort messages to dispatch

pub mod backend;
pub mod dispatch;
pub mod file_storage;
pub mod local_store;
pub mod realtime;
pub mod site_directory;

pub use backend::{IBackendService, TaskPatch};
pub use dispatch::{DispatchMessage, IDispatchNotifier};
pub use file_storage::IFileStorage;
pub use local_store::ILocalStore;
pub use realtime::{DeletedTask, IRealtimeFeed, TaskEvent};
pub use site_directory::{ISiteDirectory, SiteRecord};
