// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Principals and the static credential registry.
//!
//! Passwords are never kept in the clear: the registry stores an HMAC-SHA256
//! tag of each password under a key generated at startup, and checks login
//! attempts with `ring::hmac::verify` (constant time).

use std::collections::HashMap;
use std::path::Path;

use rand::{rngs::OsRng, RngCore};
use ring::hmac;
use serde::Deserialize;
use unicode_normalization::UnicodeNormalization;

use super::AuthError;
use crate::storage::FileName;

/// Built-in accounts used when no registry file is configured.
const DEFAULT_PRINCIPALS: [(&str, &str); 2] = [("user1", "password1"), ("user2", "password2")];

/// An authenticated identity.
///
/// The storage namespace is the username, so usernames are restricted to
/// valid single path segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Principal {
    username: String,
}

impl Principal {
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Directory name of this principal's sandbox.
    pub fn namespace(&self) -> &str {
        &self.username
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.username)
    }
}

/// Registry file entry.
#[derive(Debug, Deserialize)]
struct PrincipalEntry {
    username: String,
    password: String,
}

/// Errors raised while building the registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to read principals file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse principals file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("username {0:?} cannot be used as a storage namespace")]
    InvalidUsername(String),
    #[error("duplicate username {0:?}")]
    Duplicate(String),
}

struct StoredCredential {
    principal: Principal,
    password_tag: hmac::Tag,
}

/// Static username/password registry.
pub struct PrincipalRegistry {
    key: hmac::Key,
    credentials: HashMap<String, StoredCredential>,
    /// Tag checked for unknown usernames so both failure paths do the same work.
    decoy: hmac::Tag,
}

impl PrincipalRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        let mut key_bytes = [0u8; 32];
        OsRng.fill_bytes(&mut key_bytes);
        let key = hmac::Key::new(hmac::HMAC_SHA256, &key_bytes);
        let decoy = hmac::sign(&key, b"");
        Self {
            key,
            credentials: HashMap::new(),
            decoy,
        }
    }

    /// Registry holding the built-in `user1` and `user2` accounts.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for (username, password) in DEFAULT_PRINCIPALS {
            // Built-in names are valid path segments and distinct.
            let _ = registry.insert(username, password);
        }
        registry
    }

    /// Load principals from a JSON array of `{ "username", "password" }`.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Parse principals from a JSON array of `{ "username", "password" }`.
    pub fn from_json(raw: &str) -> Result<Self, RegistryError> {
        let entries: Vec<PrincipalEntry> = serde_json::from_str(raw)?;
        let mut registry = Self::new();
        for entry in entries {
            registry.insert(&entry.username, &entry.password)?;
        }
        Ok(registry)
    }

    /// Register a principal.
    ///
    /// # Errors
    /// - `RegistryError::InvalidUsername` if the username is not a valid
    ///   single path segment after NFC normalization
    /// - `RegistryError::Duplicate` if the username is already registered
    pub fn insert(&mut self, username: &str, password: &str) -> Result<Principal, RegistryError> {
        let username = normalize(username);
        if FileName::parse(&username).is_err() {
            return Err(RegistryError::InvalidUsername(username));
        }
        if self.credentials.contains_key(&username) {
            return Err(RegistryError::Duplicate(username));
        }

        let principal = Principal {
            username: username.clone(),
        };
        let password_tag = hmac::sign(&self.key, password.as_bytes());
        self.credentials.insert(
            username,
            StoredCredential {
                principal: principal.clone(),
                password_tag,
            },
        );
        Ok(principal)
    }

    /// Check a username/password pair.
    ///
    /// # Errors
    /// Returns `AuthError::InvalidCredentials` for an unknown user or a wrong
    /// password; the two cases are indistinguishable.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Principal, AuthError> {
        match self.credentials.get(&normalize(username)) {
            Some(stored) => {
                hmac::verify(&self.key, password.as_bytes(), stored.password_tag.as_ref())
                    .map(|_| stored.principal.clone())
                    .map_err(|_| AuthError::InvalidCredentials)
            }
            None => {
                let _ = hmac::verify(&self.key, password.as_bytes(), self.decoy.as_ref());
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}

impl Default for PrincipalRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(username: &str) -> String {
    username.nfc().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_accepts_builtin_users() {
        let registry = PrincipalRegistry::with_defaults();
        assert_eq!(registry.len(), 2);

        let principal = registry.authenticate("user1", "password1").unwrap();
        assert_eq!(principal.username(), "user1");
        assert_eq!(principal.namespace(), "user1");
        assert!(registry.authenticate("user2", "password2").is_ok());
    }

    #[test]
    fn wrong_password_and_unknown_user_fail_identically() {
        let registry = PrincipalRegistry::with_defaults();

        assert_eq!(
            registry.authenticate("user1", "password2").unwrap_err(),
            AuthError::InvalidCredentials
        );
        assert_eq!(
            registry.authenticate("mallory", "password1").unwrap_err(),
            AuthError::InvalidCredentials
        );
    }

    #[test]
    fn usernames_are_nfc_normalized() {
        let mut registry = PrincipalRegistry::new();
        // "é" as a single code point vs. "e" + combining acute accent.
        registry.insert("ren\u{00e9}", "pw").unwrap();

        let principal = registry.authenticate("rene\u{0301}", "pw").unwrap();
        assert_eq!(principal.username(), "ren\u{00e9}");
    }

    #[test]
    fn usernames_must_be_single_path_segments() {
        let mut registry = PrincipalRegistry::new();
        for bad in ["", "..", "a/b", "a\\b", "."] {
            assert!(matches!(
                registry.insert(bad, "pw"),
                Err(RegistryError::InvalidUsername(_))
            ));
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn duplicate_usernames_are_rejected() {
        let mut registry = PrincipalRegistry::new();
        registry.insert("alice", "one").unwrap();
        assert!(matches!(
            registry.insert("alice", "two"),
            Err(RegistryError::Duplicate(_))
        ));
    }

    #[test]
    fn loads_registry_from_json() {
        let registry = PrincipalRegistry::from_json(
            r#"[
                {"username": "alice", "password": "wonderland"},
                {"username": "bob", "password": "builder"}
            ]"#,
        )
        .unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.authenticate("alice", "wonderland").is_ok());
        assert!(registry.authenticate("alice", "builder").is_err());
    }

    #[test]
    fn loads_registry_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("principals.json");
        std::fs::write(&path, r#"[{"username":"carol","password":"secret"}]"#).unwrap();

        let registry = PrincipalRegistry::from_json_file(&path).unwrap();
        assert!(registry.authenticate("carol", "secret").is_ok());
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(
            PrincipalRegistry::from_json("{not json"),
            Err(RegistryError::Json(_))
        ));
    }
}
