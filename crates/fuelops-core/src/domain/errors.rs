//! Domain error types
//!
//! This module defines error types specific to domain operations:
//! validation failures, invalid task transitions, authentication failures,
//! photo upload failures and task mutation failures.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid state transition attempt
    #[error("Invalid state transition from {from} to {to}")]
    InvalidState {
        /// The current state
        from: String,
        /// The attempted target state
        to: String,
    },

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// ID parsing error
    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    /// Unknown task status value
    #[error("Invalid task status: {0}")]
    InvalidStatus(String),
}

/// Message shown for every credential failure.
///
/// Unknown accounts, wrong passwords, inactive accounts and unconfigured
/// passwords all read the same to the user.
const GENERIC_AUTH_MESSAGE: &str = "Invalid credentials. Check your details and try again.";

/// Errors produced by the login path
///
/// Every variant fails closed. Use [`AuthError::user_message`] for anything
/// displayed to the driver.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No matching account, or the password did not match
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The account exists but has been deactivated
    #[error("Account is inactive")]
    AccountInactive,

    /// The account has neither a hashed nor a legacy password
    #[error("Account has no password configured")]
    PasswordNotConfigured,

    /// The credential store could not be reached
    #[error("Credential lookup failed: {0}")]
    Backend(String),
}

impl AuthError {
    /// Text safe to show to the user
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::Backend(_) => "Unable to sign in right now. Please try again.",
            _ => GENERIC_AUTH_MESSAGE,
        }
    }
}

/// Errors produced while uploading completion photos
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// Rejected locally, no request was made
    #[error("Photo '{tag}' is {size} bytes, limit is {limit} bytes")]
    TooLarge {
        /// Photo tag (e.g. "receipt", "meter")
        tag: String,
        /// Actual size in bytes
        size: usize,
        /// Configured limit in bytes
        limit: usize,
    },

    /// The storage call failed
    #[error("Upload of '{tag}' failed: {message}")]
    Failed {
        /// Photo tag
        tag: String,
        /// Adapter error text
        message: String,
    },
}

/// Errors produced by driver-initiated task mutations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MutationError {
    /// The transition is not allowed from the task's current state
    #[error(transparent)]
    Invalid(#[from] DomainError),

    /// A completion photo could not be uploaded
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// The completion entry could not be written
    #[error("Failed to save completion entry: {0}")]
    EntryInsert(String),

    /// The status update failed
    ///
    /// `entry_saved` tells the caller whether a completion entry already
    /// exists on the backend, so a retry must not write another one.
    #[error("Failed to update task status: {message}")]
    StatusUpdate {
        /// Whether the completion entry was written before the failure
        entry_saved: bool,
        /// Adapter error text
        message: String,
    },
}
