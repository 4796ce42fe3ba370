// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authorized File Gateway
//!
//! Every file operation runs in two steps:
//!
//! 1. [`FileGateway::authorize`] verifies the session token. On failure
//!    nothing else happens: no decoding, no filesystem access.
//! 2. [`FileGateway::execute`] validates the file name, then touches the
//!    principal's sandbox.
//!
//! Create and update payloads arrive as `iv || ciphertext` and are decoded
//! with a key derived from the session token. Both overwrite existing
//! content. Reads return the stored plaintext as-is.

use std::sync::Arc;

use tracing::{debug, info};

use crate::auth::{Principal, SessionStore};
use crate::crypto::SymmetricCodec;
use crate::error::ServiceError;
use crate::storage::{FileName, SandboxStorage};

/// A file operation requested by a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOperation {
    Create { name: String, payload: Vec<u8> },
    Update { name: String, payload: Vec<u8> },
    Delete { name: String },
    Read { name: String },
}

impl FileOperation {
    fn label(&self) -> &'static str {
        match self {
            FileOperation::Create { .. } => "create",
            FileOperation::Update { .. } => "update",
            FileOperation::Delete { .. } => "delete",
            FileOperation::Read { .. } => "read",
        }
    }
}

/// Successful result of a [`FileOperation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Created,
    Updated,
    Deleted,
    Contents(Vec<u8>),
}

/// A verified session, valid for the duration of one request.
#[derive(Debug)]
pub struct AuthorizedSession {
    token: String,
    principal: Principal,
}

impl AuthorizedSession {
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub(crate) fn token(&self) -> &str {
        &self.token
    }
}

/// Session-checked access to the sandbox.
pub struct FileGateway {
    sessions: Arc<SessionStore>,
    storage: SandboxStorage,
    codec: SymmetricCodec,
}

impl FileGateway {
    pub fn new(
        sessions: Arc<SessionStore>,
        storage: SandboxStorage,
        codec: SymmetricCodec,
    ) -> Self {
        Self {
            sessions,
            storage,
            codec,
        }
    }

    pub fn storage(&self) -> &SandboxStorage {
        &self.storage
    }

    pub fn codec(&self) -> &SymmetricCodec {
        &self.codec
    }

    /// Verify `token` and bind it to its principal.
    ///
    /// # Errors
    /// `ServiceError::Unauthorized` for a missing, unknown or expired token.
    pub fn authorize(&self, token: Option<&str>) -> Result<AuthorizedSession, ServiceError> {
        let token = token.ok_or(ServiceError::Unauthorized)?;
        let principal = self.sessions.verify(token)?;
        Ok(AuthorizedSession {
            token: token.to_owned(),
            principal,
        })
    }

    /// Verify `token`, then run `operation`.
    pub fn handle(
        &self,
        token: Option<&str>,
        operation: FileOperation,
    ) -> Result<FileOutcome, ServiceError> {
        let session = self.authorize(token)?;
        self.execute(&session, operation)
    }

    /// Run `operation` in the session principal's sandbox.
    ///
    /// # Errors
    /// - `ServiceError::InputFormat` for an invalid file name (checked before any I/O)
    /// - `ServiceError::Crypto` if a payload does not decode
    /// - `ServiceError::NotFound` when deleting or reading a missing file
    /// - `ServiceError::Storage` for other filesystem failures
    pub fn execute(
        &self,
        session: &AuthorizedSession,
        operation: FileOperation,
    ) -> Result<FileOutcome, ServiceError> {
        let principal = &session.principal;
        let label = operation.label();

        let outcome = match operation {
            FileOperation::Create { name, payload } => {
                self.write(session, &name, &payload)?;
                FileOutcome::Created
            }
            FileOperation::Update { name, payload } => {
                self.write(session, &name, &payload)?;
                FileOutcome::Updated
            }
            FileOperation::Delete { name } => {
                let name = parse_name(&name)?;
                self.storage.delete_file(principal, &name)?;
                FileOutcome::Deleted
            }
            FileOperation::Read { name } => {
                let name = parse_name(&name)?;
                FileOutcome::Contents(self.storage.read_file(principal, &name)?)
            }
        };

        info!(principal = %principal, operation = label, "File operation completed");
        Ok(outcome)
    }

    fn write(
        &self,
        session: &AuthorizedSession,
        name: &str,
        payload: &[u8],
    ) -> Result<(), ServiceError> {
        let name = parse_name(name)?;
        let key = self.codec.derive_key(session.token.as_bytes());
        let plaintext = self.codec.decode(&key, payload)?;
        debug!(
            principal = %session.principal,
            file = %name,
            bytes = plaintext.len(),
            "Decoded payload"
        );
        self.storage.write_file(&session.principal, &name, &plaintext)?;
        Ok(())
    }
}

fn parse_name(name: &str) -> Result<FileName, ServiceError> {
    FileName::parse(name).map_err(|e| ServiceError::input(e.to_string()))
}
