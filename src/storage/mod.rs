// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Sandbox Storage Module
//!
//! Plaintext files, one directory per principal.
//!
//! ## Storage Layout
//!
//! ```text
//! ./files/              # DATA_DIR
//!   user1/              # principal namespace (= username)
//!     notes.txt
//!   user2/
//!     report.bin
//! ```
//!
//! ## Important Notes
//!
//! - Payloads arrive encrypted and are decoded before they reach this module;
//!   files at rest are plaintext
//! - File names are single path segments ([`FileName`]); nothing else is
//!   ever joined onto a namespace directory

pub mod paths;
pub mod sandbox;

pub use paths::{FileName, InvalidFileName, StoragePaths};
pub use sandbox::{SandboxStorage, StorageError, StorageResult};
