// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for the connection-level session token.
//!
//! The token is bound once per connection, not per message:
//!
//! ```rust,ignore
//! async fn socket(ConnectionToken(token): ConnectionToken, ws: WebSocketUpgrade) -> Response {
//!     // token: Option<String>, verified later for every file event
//! }
//! ```
//!
//! The `token` query parameter is checked first (`/ws?token=...`), then an
//! `Authorization: Bearer <token>` header. A connection without either may
//! still log in; it just cannot touch files. Verification is deferred to the
//! session store so an expired token is rejected per event, not at upgrade.

use axum::{
    extract::{FromRequestParts, Query},
    http::{header::AUTHORIZATION, request::Parts},
};
use serde::Deserialize;

use crate::error::ApiError;

/// Query parameters accepted on connection upgrade.
#[derive(Debug, Default, Deserialize)]
pub struct ConnectionParams {
    #[serde(default)]
    pub token: Option<String>,
}

/// Session token presented when the connection was opened, if any.
pub struct ConnectionToken(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for ConnectionToken {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<ConnectionParams>::try_from_uri(&parts.uri)
            .map_err(|_| ApiError::bad_request("Malformed query string"))?;

        if let Some(token) = params.token.filter(|t| !t.is_empty()) {
            return Ok(ConnectionToken(Some(token)));
        }

        let bearer = match parts.headers.get(AUTHORIZATION) {
            Some(header) => {
                let value = header
                    .to_str()
                    .map_err(|_| ApiError::bad_request("Invalid authorization header"))?;
                let token = value.strip_prefix("Bearer ").ok_or_else(|| {
                    ApiError::bad_request(
                        "Invalid authorization header format (expected 'Bearer <token>')",
                    )
                })?;
                Some(token.trim().to_owned()).filter(|t| !t.is_empty())
            }
            None => None,
        };

        Ok(ConnectionToken(bearer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};

    async fn extract(request: Request<()>) -> Result<Option<String>, ApiError> {
        let mut parts = request.into_parts().0;
        ConnectionToken::from_request_parts(&mut parts, &())
            .await
            .map(|ConnectionToken(token)| token)
    }

    #[tokio::test]
    async fn reads_token_from_query() {
        let request = Request::builder()
            .uri("/ws?token=abc-123")
            .body(())
            .unwrap();
        assert_eq!(extract(request).await.unwrap().as_deref(), Some("abc-123"));
    }

    #[tokio::test]
    async fn falls_back_to_bearer_header() {
        let request = Request::builder()
            .uri("/ws")
            .header("Authorization", "Bearer xyz-789")
            .body(())
            .unwrap();
        assert_eq!(extract(request).await.unwrap().as_deref(), Some("xyz-789"));
    }

    #[tokio::test]
    async fn query_takes_precedence_over_header() {
        let request = Request::builder()
            .uri("/ws?token=from-query")
            .header("Authorization", "Bearer from-header")
            .body(())
            .unwrap();
        assert_eq!(extract(request).await.unwrap().as_deref(), Some("from-query"));
    }

    #[tokio::test]
    async fn missing_or_empty_token_is_none() {
        let request = Request::builder().uri("/ws").body(()).unwrap();
        assert_eq!(extract(request).await.unwrap(), None);

        let request = Request::builder().uri("/ws?token=").body(()).unwrap();
        assert_eq!(extract(request).await.unwrap(), None);
    }

    #[tokio::test]
    async fn non_bearer_header_is_rejected() {
        let request = Request::builder()
            .uri("/ws")
            .header("Authorization", "Basic dXNlcjpwYXNz")
            .body(())
            .unwrap();
        let err = extract(request).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
