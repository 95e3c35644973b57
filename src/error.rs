// src/error.rs

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use mongodb::error::{ErrorKind, WriteFailure};
use std::fmt;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request (malformed form fields, failed validation)
    BadRequest(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (e.g., duplicate email)
    Conflict(String),
}

impl AppError {
    /// Message that is safe to show to the end user.
    pub fn user_message(&self) -> &str {
        match self {
            AppError::InternalServerError(_) => "Internal Server Error",
            AppError::BadRequest(msg) | AppError::NotFound(msg) | AppError::Conflict(msg) => msg,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Renders a bare HTML error page with the matching HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
        };

        let message = crate::utils::html::escape(self.user_message());
        let body = Html(format!(
            "<!doctype html><html><head><title>{status}</title></head>\
             <body><h1>{status}</h1><p>{message}</p><p><a href=\"/\">Home</a></p></body></html>"
        ));

        (status, body).into_response()
    }
}

/// MongoDB server code for a unique index violation.
const DUPLICATE_KEY_CODE: i32 = 11000;

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY_CODE,
        ErrorKind::InsertMany(e) => e
            .write_errors
            .iter()
            .flatten()
            .any(|e| e.code == DUPLICATE_KEY_CODE),
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

/// Converts driver errors into `AppError`.
/// Duplicate key violations become `Conflict`, everything else is internal.
impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        if is_duplicate_key(&err) {
            AppError::Conflict("Duplicate key".to_string())
        } else {
            AppError::InternalServerError(err.to_string())
        }
    }
}

impl From<minijinja::Error> for AppError {
    fn from(err: minijinja::Error) -> Self {
        AppError::InternalServerError(format!("template error: {err:#}"))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use mongodb::error::WriteError;

    fn write_error(code: i32) -> mongodb::error::Error {
        let write_error: WriteError =
            bson::from_document(doc! { "code": code, "errmsg": "write failed" }).unwrap();
        mongodb::error::Error::from(ErrorKind::Write(WriteFailure::WriteError(write_error)))
    }

    #[test]
    fn test_duplicate_key_becomes_conflict() {
        assert!(matches!(
            AppError::from(write_error(11000)),
            AppError::Conflict(_)
        ));
    }

    #[test]
    fn test_other_write_error_is_internal() {
        assert!(matches!(
            AppError::from(write_error(121)),
            AppError::InternalServerError(_)
        ));
    }

    #[test]
    fn test_message_text_alone_is_not_a_conflict() {
        let io = std::io::Error::other("E11000 duplicate key error");
        assert!(matches!(
            AppError::from(mongodb::error::Error::from(io)),
            AppError::InternalServerError(_)
        ));
    }
}
