//! Unified error system for the report engine
//!
//! Every fallible operation in the workspace surfaces an [`AppError`].
//! The variants map one-to-one onto the failure classes callers are
//! expected to branch on:
//!
//! - [`AppError::Validation`]: input or record invariant violated
//! - [`AppError::InvalidState`]: operation not legal for the record's
//!   current lifecycle status
//! - [`AppError::Permission`]: caller lacks the role or ownership
//! - [`AppError::NotFound`]: referenced record does not exist
//! - [`AppError::Collaborator`]: an external collaborator (storage,
//!   identity backend, file system) failed; retrying may succeed
//!
//! # Error Code Ranges
//!
//! - 0xxx: general errors
//! - 1xxx: validation and lifecycle errors
//! - 2xxx: permission errors
//! - 5xxx: collaborator errors

use thiserror::Error;

/// Unified error type for report-engine operations
#[derive(Debug, Error)]
pub enum AppError {
    /// Input or resulting record violates an invariant
    #[error("validation failed: {message}")]
    Validation { message: String },

    /// Operation is not legal for the record's current status
    #[error("invalid state: {message}")]
    InvalidState { message: String },

    /// Caller lacks the required role or ownership
    #[error("permission denied: {message}")]
    Permission { message: String },

    /// Referenced record does not exist
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// An external collaborator failed
    #[error("collaborator failure: {message}")]
    Collaborator { message: String },
}

impl AppError {
    // ========== Convenient constructors ==========

    /// Create a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create an InvalidState error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create a Permission error
    pub fn permission(message: impl Into<String>) -> Self {
        Self::Permission {
            message: message.into(),
        }
    }

    /// Create a NotFound error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a Collaborator error
    pub fn collaborator(message: impl Into<String>) -> Self {
        Self::Collaborator {
            message: message.into(),
        }
    }

    // ========== Error inspection methods ==========

    /// Get the stable error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "E1001",
            Self::InvalidState { .. } => "E1002",
            Self::Permission { .. } => "E2001",
            Self::NotFound { .. } => "E0001",
            Self::Collaborator { .. } => "E5001",
        }
    }

    /// Whether retrying the same call can reasonably succeed.
    ///
    /// Only collaborator failures are transient; every other variant is
    /// deterministic for the same input and caller.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Collaborator { .. })
    }
}

/// Result type for report-engine operations
pub type AppResult<T> = Result<T, AppError>;
