// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

/// Authentication error type.
///
/// Expired, revoked and unknown tokens all surface as `Unauthorized` so a
/// caller cannot tell why a token stopped working.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown username or wrong password
    InvalidCredentials,
    /// Missing, unknown, revoked or expired session token
    Unauthorized,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::Unauthorized => "unauthorized",
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "invalid username or password"),
            AuthError::Unauthorized => write!(f, "unauthorized"),
        }
    }
}

impl std::error::Error for AuthError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_do_not_reveal_cause() {
        assert_eq!(AuthError::Unauthorized.to_string(), "unauthorized");
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "invalid username or password"
        );
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(AuthError::Unauthorized.error_code(), "unauthorized");
        assert_eq!(
            AuthError::InvalidCredentials.error_code(),
            "invalid_credentials"
        );
    }
}
