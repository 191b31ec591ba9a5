//! # AppError
//!
//! Centralized error handling for the Bucketlist core.
//! Lookup failures are absorbed by the visibility and banner services;
//! only appeal submission surfaces errors to the caller.

use thiserror::Error;

use crate::models::ActionId;

/// The primary error type for all bl-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., User, moderation action)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., appeal message too short, bad id)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// An appeal already exists for this moderation action
    #[error("an appeal has already been submitted for action {0}")]
    DuplicateAppeal(ActionId),

    /// Backend failure while resolving relationship or moderation state
    #[error("lookup failed: {0}")]
    Lookup(String),

    /// Infrastructure failure (e.g., DB down)
    #[error("internal service error: {0}")]
    Internal(String),

    /// Request contradicts stored state (e.g., following yourself)
    #[error("conflict: {0}")]
    Conflict(String),
}

impl AppError {
    /// Errors that should be shown to the user as a benign message rather
    /// than treated as a failure.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            AppError::ValidationError(_) | AppError::DuplicateAppeal(_) | AppError::Conflict(_)
        )
    }
}

/// A specialized Result type for Bucketlist logic.
pub type Result<T> = std::result::Result<T, AppError>;
