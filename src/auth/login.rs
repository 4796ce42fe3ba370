// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login: credentials in, RSA-wrapped session token out.
//!
//! 1. Check the username/password against the [`PrincipalRegistry`].
//! 2. Build the client's RSA public key. Bad parameters fail here, before a
//!    session exists.
//! 3. Issue a session and wrap its token under the public key.
//!
//! If wrapping fails the fresh session is revoked, so a failed login never
//! leaves a usable token behind.

use std::sync::Arc;

use tracing::{info, warn};

use super::{PrincipalRegistry, SessionStore};
use crate::crypto::{KeyWrapper, PublicKeyParams};
use crate::error::ServiceError;

/// Issues wrapped session tokens for valid credentials.
pub struct Authenticator {
    principals: Arc<PrincipalRegistry>,
    sessions: Arc<SessionStore>,
    wrapper: KeyWrapper,
}

impl Authenticator {
    pub fn new(principals: Arc<PrincipalRegistry>, sessions: Arc<SessionStore>) -> Self {
        Self {
            principals,
            sessions,
            wrapper: KeyWrapper::new(),
        }
    }

    /// Authenticate and return the session token encrypted under `public_key`.
    ///
    /// # Errors
    /// - `ServiceError::Credential` for a bad password or malformed key parameters
    /// - `ServiceError::Crypto` if the token cannot be wrapped under the key
    pub fn login(
        &self,
        username: &str,
        password: &str,
        public_key: &PublicKeyParams,
    ) -> Result<Vec<u8>, ServiceError> {
        let principal = self.principals.authenticate(username, password)?;

        let rsa_key = public_key
            .to_public_key()
            .map_err(|e| ServiceError::Credential(e.to_string()))?;

        let token = self.sessions.issue(principal.clone());
        match self.wrapper.wrap_with(&rsa_key, token.as_bytes()) {
            Ok(wrapped) => {
                info!(principal = %principal, "Session issued");
                Ok(wrapped)
            }
            Err(e) => {
                self.sessions.revoke(token.as_str());
                warn!(principal = %principal, error = %e, "Token wrapping failed, session revoked");
                Err(e.into())
            }
        }
    }

    /// End the session bound to `token`. Returns whether a session existed.
    pub fn logout(&self, token: &str) -> bool {
        self.sessions.revoke(token)
    }
}
