//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Authentication failures are deliberately coarse: every credential or token problem a
//! client can cause surfaces as `AppError::Unauthorized`, so responses never reveal which
//! emails are registered or which stage of token validation failed.
//!
//! `AppError` implements `actix_web::error::ResponseError` to convert application errors
//! into HTTP responses with a `{"error": "..."}` JSON body. It also provides `From`
//! implementations for `sqlx::Error`, `validator::ValidationErrors` and
//! `argon2::password_hash::Error`, so the `?` operator works across layers.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Any credential or token validation failure (HTTP 401).
    Unauthorized(String),
    /// Authenticated, but the caller lacks the required role (HTTP 403).
    Forbidden(String),
    /// A unique resource already exists, e.g. duplicate registration (HTTP 409).
    Conflict(String),
    /// The requested resource was not found (HTTP 404).
    NotFound(String),
    /// A token could not be decoded during internal processing.
    /// Never caused by client input, so it is reported as HTTP 500.
    InvalidToken(String),
    /// Unexpected server-side error (HTTP 500).
    InternalServerError(String),
    /// Error originating from database operations (HTTP 500).
    DatabaseError(String),
    /// Failed input validation (HTTP 422 Unprocessable Entity).
    ValidationError(String),
    /// Missing or malformed configuration. Fatal at startup.
    ConfigError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::InvalidToken(msg) => write!(f, "Invalid Token: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Configuration Error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InvalidToken(_)
            | AppError::InternalServerError(_)
            | AppError::DatabaseError(_)
            | AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client errors echo their message; server-side errors are logged and
    /// replaced by a generic body so internals never leak to the caller.
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = match self {
            AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::Conflict(msg)
            | AppError::NotFound(msg)
            | AppError::ValidationError(msg) => msg.clone(),
            _ => {
                log::error!("{}", self);
                "Internal server error".to_string()
            }
        };

        HttpResponse::build(status).json(json!({ "error": message }))
    }
}

/// `RowNotFound` becomes `NotFound` and unique-constraint violations become
/// `Conflict`; everything else is a `DatabaseError`. The violated constraint is
/// logged, never returned to the client.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::Database(ref db_error) if db_error.is_unique_violation() => {
                log::warn!(
                    "Unique violation on {}",
                    db_error.constraint().unwrap_or("unknown constraint")
                );
                AppError::Conflict("Resource already exists".into())
            }
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

impl From<argon2::password_hash::Error> for AppError {
    fn from(error: argon2::password_hash::Error) -> AppError {
        AppError::InternalServerError(format!("Hashing failed: {}", error))
    }
}
