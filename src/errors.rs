//! Unified error type for the tracker.
//!
//! Storage, serialization, and task failures are fatal. Everything else is a
//! recoverable condition meant to be shown to the acting user.

use thiserror::Error;

/// Errors produced by store, workflow, and account operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A required field was empty or a submitted value was rejected
    #[error("Validation failed: {message}")]
    Validation {
        /// Human-readable reason
        message: String,
    },

    /// No account matched the supplied email and password
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The account exists but has been deactivated
    #[error("Account {email} is inactive")]
    AccountInactive {
        /// Email of the inactive account
        email: String,
    },

    /// The actor may not perform the operation, or the target is protected
    #[error("Forbidden: {reason}")]
    Forbidden {
        /// Why the operation was refused
        reason: String,
    },

    /// A region, document, request, or user id did not resolve
    #[error("{kind} not found: {id}")]
    NotFound {
        /// What kind of record was looked up
        kind: &'static str,
        /// The identifier that was not found
        id: String,
    },

    /// A pending request already exists for this email
    #[error("A pending request already exists for {email}")]
    DuplicatePending {
        /// Normalized email of the duplicate request
        email: String,
    },

    /// Configuration file could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the failure
        message: String,
    },

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A document could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A background task panicked or was aborted
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl Error {
    /// Shorthand for a validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for an authorization failure.
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    /// Shorthand for a failed lookup.
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Whether the error is a storage failure rather than a user-facing condition.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Serialization(_) | Self::Task(_)
        )
    }

    /// Message surfaced to the acting user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message } => message.clone(),
            Self::InvalidCredentials => "Invalid credentials.".to_string(),
            Self::AccountInactive { .. } => {
                "Account is inactive. Contact the administrator.".to_string()
            }
            Self::Forbidden { reason } => reason.clone(),
            Self::NotFound { kind, .. } => format!("{kind} not found."),
            Self::DuplicatePending { .. } => {
                "A pending request already exists for this email.".to_string()
            }
            Self::Config { .. } | Self::Database(_) | Self::Serialization(_) | Self::Task(_) => {
                "Internal storage error.".to_string()
            }
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
