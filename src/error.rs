// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Error types.
//!
//! - [`ServiceError`] - outcome of a single event; rendered as the reply string
//! - [`ApiError`] - HTTP-level rejection (JSON body)

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::auth::AuthError;
use crate::crypto::CryptoError;
use crate::storage::StorageError;

/// Failure of one request. Never fatal to the connection or the process.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Malformed request envelope, payload or file name
    #[error("invalid input: {0}")]
    InputFormat(String),
    /// Bad username/password or bad public key parameters
    #[error("{0}")]
    Credential(String),
    /// Missing, unknown or expired session token
    #[error("unauthorized")]
    Unauthorized,
    /// Codec or key wrapping failure
    #[error("could not process encrypted data: {0}")]
    Crypto(#[from] CryptoError),
    /// Filesystem failure; details are logged, not returned
    #[error("storage failure")]
    Storage(#[source] StorageError),
    /// Requested file does not exist
    #[error("file not found: {0}")]
    NotFound(String),
}

impl ServiceError {
    pub fn input(message: impl Into<String>) -> Self {
        ServiceError::InputFormat(message.into())
    }

    /// Stable machine-readable code, used in logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceError::InputFormat(_) => "input_format",
            ServiceError::Credential(_) => "invalid_credentials",
            ServiceError::Unauthorized => "unauthorized",
            ServiceError::Crypto(_) => "crypto_error",
            ServiceError::Storage(_) => "storage_error",
            ServiceError::NotFound(_) => "not_found",
        }
    }
}

impl From<AuthError> for ServiceError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => ServiceError::Credential(e.to_string()),
            AuthError::Unauthorized => ServiceError::Unauthorized,
        }
    }
}

impl From<StorageError> for ServiceError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(name) => ServiceError::NotFound(name),
            other => ServiceError::Storage(other),
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn auth_errors_map_onto_taxonomy() {
        let credential: ServiceError = AuthError::InvalidCredentials.into();
        assert_eq!(credential.error_code(), "invalid_credentials");
        assert_eq!(credential.to_string(), "invalid username or password");

        let unauthorized: ServiceError = AuthError::Unauthorized.into();
        assert!(matches!(unauthorized, ServiceError::Unauthorized));
        assert_eq!(unauthorized.to_string(), "unauthorized");
    }

    #[test]
    fn storage_not_found_becomes_not_found() {
        let err: ServiceError = StorageError::NotFound("notes.txt".into()).into();
        assert!(matches!(err, ServiceError::NotFound(ref name) if name == "notes.txt"));
        assert_eq!(err.to_string(), "file not found: notes.txt");
    }

    #[test]
    fn storage_failures_hide_details() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "/srv/files/user1");
        let err: ServiceError = StorageError::Io(io).into();
        assert_eq!(err.error_code(), "storage_error");
        assert_eq!(err.to_string(), "storage failure");
    }

    #[test]
    fn crypto_errors_are_described() {
        let err: ServiceError = CryptoError::TooShort.into();
        assert_eq!(
            err.to_string(),
            "could not process encrypted data: ciphertext is shorter than one block"
        );
    }

    #[tokio::test]
    async fn api_error_returns_json_body() {
        let response = ApiError::bad_request("bad data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"error":"bad data"}"#);
    }
}
