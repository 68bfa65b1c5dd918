//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the
//! application. It centralizes error management so that validation failures,
//! authentication failures, missing rows, and database trouble all turn into
//! the HTTP response the API contract promises.
//!
//! `AppError` implements `actix_web::error::ResponseError` so handlers can
//! simply return `Result<_, AppError>` and use the `?` operator. `From` impls
//! are provided for `sqlx::Error`, `validator::ValidationErrors`, and
//! `bcrypt::BcryptError`.
//!
//! Validation failures carry the full field-keyed error set and render as
//! `422 {"message": "The given data was invalid.", "errors": {...}}`.
//! Database and internal errors are logged server-side and rendered as an
//! opaque `500 {"message": "Server Error"}`; the detail never reaches the
//! client.

use actix_web::{error::ResponseError, HttpResponse};
use serde_json::{json, Map, Value};
use std::fmt;
use validator::{ValidationError, ValidationErrors};

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Authentication failed or is missing (HTTP 401).
    Unauthorized(String),
    /// Malformed or otherwise unusable request (HTTP 400).
    BadRequest(String),
    /// A requested resource does not exist (HTTP 404).
    NotFound(String),
    /// An unexpected server-side failure (HTTP 500).
    InternalServerError(String),
    /// A database operation failed (HTTP 500). Wraps `sqlx` errors.
    DatabaseError(String),
    /// Input validation failed (HTTP 422). Carries the per-field errors.
    ValidationError(ValidationErrors),
}

impl AppError {
    /// Builds a `ValidationError` for a single field, for rules that cannot
    /// be expressed as a `validator` derive attribute (e.g. uniqueness checks
    /// that require a database round trip).
    pub fn field_error(field: &'static str, code: &'static str, message: &str) -> Self {
        let mut error = ValidationError::new(code);
        error.message = Some(message.to_string().into());
        let mut errors = ValidationErrors::new();
        errors.add(field, error);
        AppError::ValidationError(errors)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
            AppError::ValidationError(errors) => write!(f, "Validation Error: {}", errors),
        }
    }
}

/// Flattens `ValidationErrors` into the `{field: [messages]}` map used in
/// 422 response bodies.
fn validation_error_map(errors: &ValidationErrors) -> Map<String, Value> {
    let mut map = Map::new();
    for (field, field_errors) in errors.field_errors() {
        let messages: Vec<Value> = field_errors
            .iter()
            .map(|e| match &e.message {
                Some(msg) => Value::String(msg.to_string()),
                None => Value::String(format!("The {} field is invalid.", field)),
            })
            .collect();
        map.insert(field.to_string(), Value::Array(messages));
    }
    map
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Unauthorized(msg) => HttpResponse::Unauthorized().json(json!({
                "message": msg
            })),
            AppError::BadRequest(msg) => HttpResponse::BadRequest().json(json!({
                "message": msg
            })),
            AppError::NotFound(msg) => HttpResponse::NotFound().json(json!({
                "message": msg
            })),
            // Internal detail stays in the logs; clients get an opaque body.
            AppError::InternalServerError(msg) => {
                log::error!("internal error: {}", msg);
                HttpResponse::InternalServerError().json(json!({
                    "message": "Server Error"
                }))
            }
            AppError::DatabaseError(msg) => {
                log::error!("database error: {}", msg);
                HttpResponse::InternalServerError().json(json!({
                    "message": "Server Error"
                }))
            }
            AppError::ValidationError(errors) => HttpResponse::UnprocessableEntity().json(json!({
                "message": "The given data was invalid.",
                "errors": validation_error_map(errors)
            })),
        }
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// `RowNotFound` becomes a 404; anything else is a database error.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> AppError {
        AppError::ValidationError(errors)
    }
}

/// Password hashing or verification failure. Never exposed as-is.
impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_responses() {
        let error = AppError::Unauthorized("Unauthenticated".into());
        let response = error.error_response();
        assert_eq!(response.status(), 401);

        let error = AppError::BadRequest("Invalid input".into());
        let response = error.error_response();
        assert_eq!(response.status(), 400);

        let error = AppError::NotFound("Product Not Found".into());
        let response = error.error_response();
        assert_eq!(response.status(), 404);

        let error = AppError::InternalServerError("boom".into());
        let response = error.error_response();
        assert_eq!(response.status(), 500);
    }

    #[test]
    fn test_validation_error_response_is_field_keyed() {
        let error = AppError::field_error("email", "unique", "The email has already been taken.");
        let response = error.error_response();
        assert_eq!(response.status(), 422);

        if let AppError::ValidationError(errors) = AppError::field_error(
            "email",
            "unique",
            "The email has already been taken.",
        ) {
            let map = validation_error_map(&errors);
            let messages = map.get("email").and_then(|v| v.as_array()).unwrap();
            assert_eq!(
                messages[0].as_str(),
                Some("The email has already been taken.")
            );
        } else {
            panic!("field_error should build a ValidationError variant");
        }
    }

    #[test]
    fn test_row_not_found_maps_to_404() {
        let error: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(error, AppError::NotFound(_)));
    }
}
