// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! RSA wrapping of session secrets.
//!
//! The client sends the modulus and public exponent of its RSA key as decimal
//! strings. The secret is encrypted with RSAES-PKCS1-v1_5; only the holder of
//! the matching private key can recover it. Unwrapping never happens here.

use rand::rngs::OsRng;
use rsa::{BigUint, Pkcs1v15Encrypt, RsaPublicKey};
use serde::{Deserialize, Serialize};

use super::CryptoError;

/// Public key parameters as supplied by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyParams {
    /// Modulus `n`, decimal.
    pub modulus: String,
    /// Public exponent `e`, decimal.
    pub exponent: String,
}

impl PublicKeyParams {
    pub fn new(modulus: impl Into<String>, exponent: impl Into<String>) -> Self {
        Self {
            modulus: modulus.into(),
            exponent: exponent.into(),
        }
    }

    /// Build the RSA public key these parameters describe.
    ///
    /// # Errors
    /// Returns `CryptoError::KeyFormat` if either number fails to parse or
    /// the resulting key is rejected (exponent out of range, modulus too large).
    pub fn to_public_key(&self) -> Result<RsaPublicKey, CryptoError> {
        let n = parse_decimal(&self.modulus)
            .ok_or_else(|| CryptoError::KeyFormat("modulus is not a decimal integer".into()))?;
        let e: u64 = self
            .exponent
            .trim()
            .parse()
            .map_err(|_| CryptoError::KeyFormat("exponent is not a decimal integer".into()))?;

        RsaPublicKey::new(n, BigUint::from(e)).map_err(|e| CryptoError::KeyFormat(e.to_string()))
    }
}

fn parse_decimal(value: &str) -> Option<BigUint> {
    let value = value.trim();
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// Wraps secrets under client-supplied RSA public keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyWrapper;

impl KeyWrapper {
    pub fn new() -> Self {
        Self
    }

    /// Encrypt `secret` under the public key described by `params`.
    ///
    /// # Errors
    /// - `CryptoError::KeyFormat` for unparseable or invalid key parameters
    /// - `CryptoError::Encryption` if the secret does not fit the key
    pub fn wrap(&self, params: &PublicKeyParams, secret: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let public_key = params.to_public_key()?;
        self.wrap_with(&public_key, secret)
    }

    /// Encrypt `secret` under an already validated public key.
    pub fn wrap_with(
        &self,
        public_key: &RsaPublicKey,
        secret: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        public_key
            .encrypt(&mut OsRng, Pkcs1v15Encrypt, secret)
            .map_err(|e| CryptoError::Encryption(e.to_string()))
    }
}
