// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session Vault - Session-keyed encrypted file service
//!
//! Clients log in with a password and an RSA public key, receive their
//! session token wrapped under that key, then create, edit, read and delete
//! files in a per-user sandbox. File payloads are AES-CBC encrypted under a
//! key derived from the session token.
//!
//! ## Modules
//!
//! - `api` - HTTP routes and the WebSocket event endpoint (Axum)
//! - `auth` - Principals, sessions, login and the session reaper
//! - `crypto` - AES-CBC payload codec and RSA key wrapping
//! - `dispatch` - Event names to typed requests and replies
//! - `gateway` - Session-checked file operations
//! - `storage` - Per-user sandboxed file storage

pub mod api;
pub mod auth;
pub mod config;
pub mod crypto;
pub mod dispatch;
pub mod error;
pub mod gateway;
pub mod models;
pub mod state;
pub mod storage;
