use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub title: String,
    pub description: String,
}

impl FieldError {
    pub fn new(field: &str, title: impl Into<String>, description: impl Into<String>) -> Self {
        FieldError {
            field: field.to_string(),
            title: title.into(),
            description: description.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum SpendlyError {
    /// Email field is empty
    #[error("Email is required")]
    MissingEmail,

    /// Email is already registered
    #[error("Email {0} already registered")]
    EmailAlreadyRegistered(String),

    /// Email format is invalid
    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    /// Field-level validation failure on a write request
    #[error("Invalid input for field `{0}`: {1:?}")]
    InvalidInput(String, FieldError),

    /// Malformed filter, ordering or pagination parameter
    #[error("Invalid parameter `{0}`: {1}")]
    InvalidParameter(String, String),

    /// Expense does not exist or belongs to somebody else
    #[error("Expense {0} not found")]
    ExpenseNotFound(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is inactive")]
    InactiveAccount,

    /// Missing, expired or otherwise unusable bearer credential
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Too many requests, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Internal server error: {0}")]
    InternalServerError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Logging error: {0}")]
    LoggingError(String),
}

impl SpendlyError {
    pub fn invalid_input(field: &str, title: impl Into<String>, description: impl Into<String>) -> Self {
        SpendlyError::InvalidInput(field.to_string(), FieldError::new(field, title, description))
    }

    pub fn invalid_parameter(param: &str, message: impl Into<String>) -> Self {
        SpendlyError::InvalidParameter(param.to_string(), message.into())
    }

    /// Whether the error hides an internal failure from the caller.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            SpendlyError::InternalServerError(_) | SpendlyError::StorageError(_) | SpendlyError::LoggingError(_)
        )
    }
}
