// ABOUTME: Unified error handling with standard error codes and HTTP responses
// ABOUTME: Maps connection, authentication, validation and engine failures to JSON bodies
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cube Gateway Contributors

//! # Error Handling
//!
//! Every fallible operation in the crate returns [`AppResult`]. Per-request
//! errors are converted to structured JSON at the gateway boundary through the
//! [`IntoResponse`] impl; startup errors propagate to `main` and terminate the
//! process.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use cube_core::ModelError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

/// Message returned to clients in place of engine internals
pub const GENERIC_ENGINE_ERROR_MESSAGE: &str = "An internal error occurred while executing the query";

/// Error taxonomy exposed to clients as `error.type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Backend unreachable or misconfigured
    ConnectionError,
    /// Security context could not be resolved
    AuthenticationError,
    /// Query references unknown cubes/members or is malformed
    ValidationError,
    /// Opaque failure while translating or executing a query
    EngineError,
    /// Invalid startup configuration
    ConfigurationError,
}

/// Standard error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Database transport could not be constructed
    ConnectionFailed,
    /// Identity material missing
    AuthRequired,
    /// Identity material present but invalid
    AuthInvalid,
    /// Identity valid but not allowed to query
    PermissionDenied,
    /// Malformed request or query
    InvalidInput,
    /// Query references a cube that is not registered
    UnknownCube,
    /// Query references a member the cube does not define
    UnknownMember,
    /// Route or resource not found
    ResourceNotFound,
    /// Route exists but not for this method
    MethodNotAllowed,
    /// Request body over the size limit
    PayloadTooLarge,
    /// Request did not complete within the configured timeout
    RequestTimeout,
    /// Query engine failure
    EngineFailure,
    /// Database returned an error while executing
    DatabaseError,
    /// Startup configuration invalid
    ConfigError,
    /// Anything else
    InternalError,
}

impl ErrorCode {
    /// HTTP status code for this error
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::AuthRequired | Self::AuthInvalid => 401,
            Self::PermissionDenied => 403,
            Self::InvalidInput | Self::UnknownCube | Self::UnknownMember => 400,
            Self::ResourceNotFound => 404,
            Self::MethodNotAllowed => 405,
            Self::RequestTimeout => 408,
            Self::PayloadTooLarge => 413,
            Self::ConnectionFailed => 503,
            Self::EngineFailure | Self::DatabaseError | Self::ConfigError | Self::InternalError => {
                500
            }
        }
    }

    /// Taxonomy kind of this code
    #[must_use]
    pub const fn kind(self) -> ErrorKind {
        match self {
            Self::ConnectionFailed => ErrorKind::ConnectionError,
            Self::AuthRequired | Self::AuthInvalid | Self::PermissionDenied => {
                ErrorKind::AuthenticationError
            }
            Self::InvalidInput
            | Self::UnknownCube
            | Self::UnknownMember
            | Self::ResourceNotFound
            | Self::MethodNotAllowed
            | Self::PayloadTooLarge => ErrorKind::ValidationError,
            Self::EngineFailure
            | Self::DatabaseError
            | Self::InternalError
            | Self::RequestTimeout => ErrorKind::EngineError,
            Self::ConfigError => ErrorKind::ConfigurationError,
        }
    }

    /// Whether the message may be shown to clients verbatim
    #[must_use]
    pub const fn is_client_visible(self) -> bool {
        matches!(self, Self::RequestTimeout)
            || !matches!(
                self.kind(),
                ErrorKind::EngineError | ErrorKind::ConnectionError | ErrorKind::ConfigurationError
            )
    }
}

/// Application error carrying a code and a message
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code:?}: {message}")]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Detail message (may be internal; see [`ErrorCode::is_client_visible`])
    pub message: String,
}

/// Result alias used across the crate
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create an error with an explicit code
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Database transport could not be constructed
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConnectionFailed, message)
    }

    /// Identity material missing
    #[must_use]
    pub fn auth_required(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthRequired, message)
    }

    /// Identity material invalid
    #[must_use]
    pub fn auth_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthInvalid, message)
    }

    /// Caller not allowed
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PermissionDenied, message)
    }

    /// Malformed input
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Query references an unregistered cube
    #[must_use]
    pub fn unknown_cube(cube: &str) -> Self {
        Self::new(
            ErrorCode::UnknownCube,
            format!("Cube '{cube}' is not defined"),
        )
    }

    /// Query references an undefined member
    #[must_use]
    pub fn unknown_member(member: &str, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::UnknownMember,
            format!("{member}: {}", message.into()),
        )
    }

    /// Resource not found
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceNotFound,
            format!("{} not found", resource.into()),
        )
    }

    /// No handler for this method on an existing route
    #[must_use]
    pub fn method_not_allowed(method: &str, path: &str) -> Self {
        Self::new(
            ErrorCode::MethodNotAllowed,
            format!("Method {method} is not allowed on {path}"),
        )
    }

    /// Request body over `limit` bytes
    #[must_use]
    pub fn payload_too_large(limit: usize) -> Self {
        Self::new(
            ErrorCode::PayloadTooLarge,
            format!("Request body exceeds {limit} bytes"),
        )
    }

    /// Request exceeded the server timeout
    #[must_use]
    pub fn timeout(timeout: std::time::Duration) -> Self {
        Self::new(
            ErrorCode::RequestTimeout,
            format!("Request did not complete within {}s", timeout.as_secs()),
        )
    }

    /// Query engine failure
    #[must_use]
    pub fn engine(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::EngineFailure, message)
    }

    /// Database execution failure
    #[must_use]
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Invalid configuration
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Internal failure
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// HTTP status for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Message safe to return to a client
    #[must_use]
    pub fn client_message(&self) -> &str {
        if self.code.is_client_visible() {
            &self.message
        } else {
            GENERIC_ENGINE_ERROR_MESSAGE
        }
    }
}

/// JSON body returned for every failed request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error detail
    pub error: ErrorBody,
    /// RFC 3339 timestamp
    pub timestamp: String,
}

/// Error detail inside [`ErrorResponse`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Taxonomy kind
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    /// Error code
    pub code: ErrorCode,
    /// Client-facing message
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.code.is_client_visible() {
            warn!(code = ?self.code, "Request rejected: {}", self.message);
        } else {
            error!(code = ?self.code, "Request failed: {}", self.message);
        }

        let body = ErrorResponse {
            error: ErrorBody {
                kind: self.code.kind(),
                code: self.code,
                message: self.client_message().to_owned(),
            },
            timestamp: Utc::now().to_rfc3339(),
        };

        (self.status_code(), Json(body)).into_response()
    }
}

impl From<ModelError> for AppError {
    fn from(error: ModelError) -> Self {
        Self::invalid_input(error.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        Self::database(format!("Database error: {error}"))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        Self::database(format!("Serverless transport error: {error}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_follows_taxonomy() {
        assert_eq!(AppError::auth_required("x").status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::forbidden("x").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::unknown_cube("Nope").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::engine("boom").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::connection("down").status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::method_not_allowed("GET", "/x").status_code(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            AppError::payload_too_large(10).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn timeout_message_reaches_clients() {
        let err = AppError::timeout(std::time::Duration::from_secs(30));
        assert_eq!(err.status_code(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(err.client_message(), "Request did not complete within 30s");
    }

    #[test]
    fn engine_detail_is_hidden_from_clients() {
        let err = AppError::database("relation \"secret_table\" does not exist");
        assert_eq!(err.client_message(), GENERIC_ENGINE_ERROR_MESSAGE);
        assert_eq!(err.code.kind(), ErrorKind::EngineError);

        let err = AppError::unknown_cube("Ghosts");
        assert_eq!(err.client_message(), "Cube 'Ghosts' is not defined");
        assert_eq!(err.code.kind(), ErrorKind::ValidationError);
    }
}
