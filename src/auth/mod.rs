// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Password login with RSA-wrapped session tokens.
//!
//! ## Auth Flow
//!
//! 1. Client sends `login` with username, password and its RSA public key
//!    (modulus and exponent as decimal strings)
//! 2. Server:
//!    - Checks the credentials against the principal registry
//!    - Issues a random UUID session token (5 minute TTL)
//!    - Returns the token encrypted under the client's public key
//! 3. Client decrypts the token and reconnects with `?token=<token>`
//! 4. Every file event re-verifies the token; the token also keys the
//!    payload cipher
//!
//! ## Security
//!
//! - Expired and unknown tokens are indistinguishable to the client
//! - Expired sessions are evicted on first observation and by the reaper
//! - Passwords are compared in constant time

pub mod error;
pub mod extractor;
pub mod login;
pub mod principal;
pub mod reaper;
pub mod session;

pub use error::AuthError;
pub use extractor::ConnectionToken;
pub use login::Authenticator;
pub use principal::{Principal, PrincipalRegistry, RegistryError};
pub use reaper::SessionReaper;
pub use session::{Session, SessionStore, SessionToken, DEFAULT_SESSION_TTL};
