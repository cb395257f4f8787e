//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Every failure a handler can hit is expressed as one of its variants, and the
//! `actix_web::error::ResponseError` implementation turns it into an HTTP response
//! with a `{"detail": "..."}` JSON body.
//!
//! `From` implementations for `sqlx::Error`, `validator::ValidationErrors`,
//! `jsonwebtoken::errors::Error` and `bcrypt::BcryptError` let handlers use `?`.

use actix_web::{
    error::{JsonPayloadError, QueryPayloadError, ResponseError, UrlencodedError},
    http::header,
    HttpRequest, HttpResponse,
};
use log::error;
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

/// Postgres SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Authentication failed or is missing (HTTP 401).
    Unauthorized(String),
    /// The authenticated user lacks the rights for the operation (HTTP 403).
    Forbidden(String),
    /// Malformed or rejected request (HTTP 400).
    BadRequest(String),
    /// The requested resource does not exist (HTTP 404).
    NotFound(String),
    /// The resource already exists (HTTP 409).
    Conflict(String),
    /// Input failed validation (HTTP 422 Unprocessable Entity).
    ValidationError(String),
    /// Unexpected server-side error (HTTP 500).
    InternalServerError(String),
    /// Error from database operations (HTTP 500).
    DatabaseError(String),
}

impl AppError {
    /// The 404 raised when a lookup by key finds nothing, e.g.
    /// `Term object does not exists.`
    pub fn not_found(model: &str) -> Self {
        AppError::NotFound(format!("{} object does not exists.", model))
    }

    /// The 401 raised when a bearer token can't be trusted.
    pub fn invalid_credentials() -> Self {
        AppError::Unauthorized("could not validate credentials".into())
    }

    /// The 403 raised by administrative routes.
    pub fn not_enough_permission() -> Self {
        AppError::Forbidden("not enough permission.".into())
    }

    fn detail(&self) -> &str {
        match self {
            AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::ValidationError(msg)
            | AppError::InternalServerError(msg) => msg,
            // Database details stay in the logs.
            AppError::DatabaseError(_) => "database error",
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
        }
    }
}

/// Converts `AppError` variants into `HttpResponse` objects.
impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let body = json!({ "detail": self.detail() });
        match self {
            AppError::Unauthorized(_) => HttpResponse::Unauthorized()
                .insert_header((header::WWW_AUTHENTICATE, "Bearer"))
                .json(body),
            AppError::Forbidden(_) => HttpResponse::Forbidden().json(body),
            AppError::BadRequest(_) => HttpResponse::BadRequest().json(body),
            AppError::NotFound(_) => HttpResponse::NotFound().json(body),
            AppError::Conflict(_) => HttpResponse::Conflict().json(body),
            AppError::ValidationError(_) => HttpResponse::UnprocessableEntity().json(body),
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                HttpResponse::InternalServerError().json(body)
            }
        }
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// `RowNotFound` becomes a 404 and unique violations a 409; anything else is
/// logged and reported as a database error.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        if let sqlx::Error::RowNotFound = error {
            return AppError::NotFound("Record not found".into());
        }
        if let Some(db_error) = error.as_database_error() {
            if db_error.code().as_deref() == Some(UNIQUE_VIOLATION) {
                return AppError::Conflict("object already exists.".into());
            }
        }
        error!("database error: {}", error);
        AppError::DatabaseError(error.to_string())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

/// JWT failures always surface as a generic 401.
impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(_: jsonwebtoken::errors::Error) -> AppError {
        AppError::invalid_credentials()
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}

/// JSON body errors are reported as 422 with the deserializer message.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::ValidationError(err.to_string()).into()
}

/// Query string errors are reported as 422 with the deserializer message.
pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::ValidationError(err.to_string()).into()
}

/// Form body errors are reported as 422 with the deserializer message.
pub fn form_error_handler(err: UrlencodedError, _req: &HttpRequest) -> actix_web::Error {
    AppError::ValidationError(err.to_string()).into()
}
