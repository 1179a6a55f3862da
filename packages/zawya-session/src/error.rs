//! Error types for the session service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::fmt;

/// Session service error.
#[derive(Debug)]
pub enum Error {
    /// Configuration error.
    Config(String),
    /// Album snapshot could not be read or written.
    Store(String),
    /// Request referenced a zone outside the catalog.
    UnknownZone(String),
    /// Request rejected before reaching the session.
    BadRequest(String),
    /// The session task has stopped.
    SessionClosed,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "config error: {msg}"),
            Error::Store(msg) => write!(f, "album store error: {msg}"),
            Error::UnknownZone(id) => write!(f, "unknown zone: {id}"),
            Error::BadRequest(msg) => write!(f, "bad request: {msg}"),
            Error::SessionClosed => write!(f, "session closed"),
        }
    }
}

impl std::error::Error for Error {}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::Config(_) | Error::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::UnknownZone(_) => StatusCode::NOT_FOUND,
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::SessionClosed => StatusCode::SERVICE_UNAVAILABLE,
        };
        let body = serde_json::json!({
            "success": false,
            "error": self.to_string()
        });
        (status, Json(body)).into_response()
    }
}
