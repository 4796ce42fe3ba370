// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory session store.
//!
//! ## Lifecycle
//!
//! ```text
//! issue() ──▶ Active ──(now > expires_at, observed by verify/purge)──▶ evicted
//!                └────────────(revoke / logout)─────────────────────▶ evicted
//! ```
//!
//! There is no refresh-on-use: a session lives exactly one TTL from issue.
//! Expiry is enforced by comparison; evicted sessions are simply absent.
//!
//! ## Concurrency
//!
//! A single mutex guards the whole map. Lookup and eviction of a token happen
//! under one lock acquisition, so concurrent verifies of an expired token
//! evict it exactly once and never observe it alive afterwards.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

use super::{AuthError, Principal};

/// Default session lifetime (5 minutes).
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(300);

/// Opaque session token.
///
/// A random UUID v4 in its 36-character hyphenated form. The same string is
/// the secret the payload key is derived from, so it is redacted in `Debug`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    fn generate() -> Self {
        SessionToken(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

/// A live session bound to one principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub principal: Principal,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Token → session map with a fixed TTL.
pub struct SessionStore {
    ttl: TimeDelta,
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Issue a new session for `principal`.
    pub fn issue(&self, principal: Principal) -> SessionToken {
        self.issue_at(principal, Utc::now())
    }

    /// Issue a new session as if the current time were `now`.
    pub fn issue_at(&self, principal: Principal, now: DateTime<Utc>) -> SessionToken {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let session = Session {
            principal,
            issued_at: now,
            expires_at,
        };

        let mut sessions = self.lock();
        let token = loop {
            let candidate = SessionToken::generate();
            if !sessions.contains_key(candidate.as_str()) {
                break candidate;
            }
        };
        sessions.insert(token.as_str().to_owned(), session);
        token
    }

    /// Resolve a token to its principal.
    ///
    /// # Errors
    /// Returns `AuthError::Unauthorized` if the token is unknown or expired.
    /// An expired session is evicted by the call that observes it.
    pub fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// [`verify`](Self::verify) as if the current time were `now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Principal, AuthError> {
        let mut sessions = self.lock();
        match sessions.get(token) {
            None => return Err(AuthError::Unauthorized),
            Some(session) if !session.is_expired_at(now) => return Ok(session.principal.clone()),
            Some(_) => {}
        }
        sessions.remove(token);
        Err(AuthError::Unauthorized)
    }

    /// Look up a session without evicting it.
    pub fn get(&self, token: &str) -> Option<Session> {
        self.lock().get(token).cloned()
    }

    /// Remove a session. Returns whether it existed.
    pub fn revoke(&self, token: &str) -> bool {
        self.lock().remove(token).is_some()
    }

    /// Evict every session expired at `now`. Returns how many were removed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired_at(now));
        before - sessions.len()
    }

    /// Number of sessions currently held (expired ones included until evicted).
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Session>> {
        // The map stays consistent even if a holder panicked mid-call.
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}
