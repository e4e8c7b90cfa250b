//! FuelOps Core - Domain logic and business rules for the driver client
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `Task`, `TaskEntry`, `DriverProfile`, `DriverRecord`, `Notification`
//! - **Use cases** - `AuthenticateUseCase`, `TaskActionsUseCase`, `NotificationsUseCase`,
//!   `PushRegistrationUseCase`
//! - **Port definitions** - Traits for adapters: `IBackendService`, `ISiteDirectory`,
//!   `IFileStorage`, `IRealtimeFeed`, `ILocalStore`, `IDispatchNotifier`
//! - **Task lifecycle** - pending / in progress / completed / issue transitions
//!
//! # Architecture
//!
//! The domain module contains pure business logic with no I/O.
//! Ports define trait interfaces that adapter crates implement.
//! Use cases orchestrate domain entities through port interfaces.

pub mod config;
pub mod domain;
pub mod ports;
pub mod usecases;
