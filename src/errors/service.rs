use thiserror::Error;

use super::RepositoryError;
use crate::validations::FieldError;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input failed one or more field checks
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        errors: Vec<FieldError>,
    },

    /// The client exhausted its submission window
    #[error("Too many requests. Please try again later.")]
    RateLimited { retry_after_secs: u64 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl ServiceError {
    /// Builds a validation error whose message joins the per-field messages
    pub fn from_field_errors(errors: Vec<FieldError>) -> Self {
        let message = errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        ServiceError::Validation { message, errors }
    }
}
