// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Cryptography Module
//!
//! Two primitives protect a session:
//!
//! - [`codec`] - AES-CBC payload codec keyed by the session token
//! - [`key_wrap`] - RSA PKCS#1 v1.5 wrapping of the token for the client
//!
//! ## Payload Format
//!
//! ```text
//! +----------------+----------------------------------+
//! | IV (16 bytes)  | ciphertext (n * 16 bytes)        |
//! +----------------+----------------------------------+
//! ```
//!
//! There is no authentication tag. A modified ciphertext decodes to garbage
//! instead of failing.

pub mod codec;
pub mod key_wrap;

pub use codec::{KeySize, Padding, SymmetricCodec, SymmetricKey, BLOCK_SIZE};
pub use key_wrap::{KeyWrapper, PublicKeyParams};

/// Error type for codec and key wrapping operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    /// Input is not a whole number of cipher blocks
    #[error("input of {0} bytes is not a multiple of the 16-byte block size")]
    Misaligned(usize),
    /// Blob is too short to carry an IV
    #[error("ciphertext is shorter than one block")]
    TooShort,
    /// PKCS#7 padding did not verify after decryption
    #[error("invalid padding")]
    Padding,
    /// Derived key does not fit the cipher
    #[error("invalid symmetric key length")]
    InvalidKeyLength,
    /// Public key parameters could not be parsed or were rejected
    #[error("invalid public key: {0}")]
    KeyFormat(String),
    /// Asymmetric encryption failed (usually the secret is too long)
    #[error("key wrapping failed: {0}")]
    Encryption(String),
}
