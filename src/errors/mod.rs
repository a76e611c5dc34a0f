use std::io::Error as IoError;

use actix_web::{
    http::{header, StatusCode},
    HttpResponse, ResponseError,
};
use serde_json::json;
use thiserror::Error;

pub mod config;
pub mod repository;
pub mod service;

pub use config::ConfigError;
pub use repository::RepositoryError;
pub use service::ServiceError;

use crate::validations::FieldError;

/// Message returned to clients whenever storage fails during a submission
pub const SUBMISSION_FAILED_MESSAGE: &str =
    "Failed to submit consultation request. Please try again.";

#[derive(Debug, Error)]
pub enum AppError {
    // Service-level domain errors
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        errors: Vec<FieldError>,
    },
    #[error("Rate limit error: Too many requests. Please try again later.")]
    TooManyRequests { retry_after_secs: u64 },
    #[error("Unauthorized: Missing or invalid admin credentials")]
    Unauthorized,
    #[error("Conflict error: {0}")]
    Conflict(String),
    #[error("Not found error: {0}")]
    NotFound(String),
    #[error("Internal error: {0}")]
    Internal(String),
    // Infrastructure/system errors
    #[error("Server error: {0}")]
    Server(#[from] IoError),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Logger error: {0}")]
    Logger(String),
    #[error("Database error: {0}")]
    Database(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            errors: Vec::new(),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(msg) => AppError::NotFound(msg),
            RepositoryError::Conflict(msg) => AppError::Conflict(msg),
            RepositoryError::InvalidData(msg) => AppError::validation(msg),
            RepositoryError::Database(e) => AppError::Database(e.to_string()),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation { message, errors } => {
                AppError::Validation { message, errors }
            }
            ServiceError::RateLimited { retry_after_secs } => {
                AppError::TooManyRequests { retry_after_secs }
            }
            ServiceError::NotFound(msg) => AppError::NotFound(msg),
            ServiceError::Internal(msg) => AppError::Internal(msg),
            ServiceError::Repository(e) => AppError::from(e),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        // Flatten field errors into a single string
        let message = errors
            .field_errors()
            .iter()
            .map(|(field, errs)| {
                let reasons = errs
                    .iter()
                    .map(|e| e.message.clone().unwrap_or_else(|| "invalid".into()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{}: {}", field, reasons)
            })
            .collect::<Vec<_>>()
            .join("; ");
        AppError::validation(message)
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_)
            | AppError::Server(_)
            | AppError::Config(_)
            | AppError::Logger(_)
            | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error_string = self.to_string();
        let (error_type, message) = error_string
            .split_once(":")
            .map(|(t, m)| (t.trim(), m.trim()))
            .unwrap_or(("Error", "An error occurred"));

        // Infrastructure details stay in the logs
        let message = match self {
            AppError::Server(_) | AppError::Config(_) | AppError::Logger(_) | AppError::Database(_) => {
                log::error!("{}", error_string);
                "An error occurred processing your request"
            }
            _ if message.is_empty() => "An error occurred",
            _ => message,
        };

        let code = self.status_code().as_u16();
        let mut body = json!({
            "success": false,
            "type": error_type.to_uppercase(),
            "message": message,
            "status_code": code,
        });

        if let AppError::Validation { errors, .. } = self {
            if !errors.is_empty() {
                body["errors"] = json!(errors);
            }
        }

        let mut builder = HttpResponse::build(self.status_code());
        match self {
            AppError::TooManyRequests { retry_after_secs } => {
                builder
                    .insert_header((header::RETRY_AFTER, retry_after_secs.to_string()))
                    .insert_header(("X-RateLimit-Remaining", "0"));
            }
            AppError::Unauthorized => {
                builder.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
            }
            _ => {}
        }
        builder.json(body)
    }
}
