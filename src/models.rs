// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Wire Data Models
//!
//! Request payloads carried inside WebSocket event envelopes. All types derive
//! `Deserialize` and `ToSchema` so they are documented alongside the HTTP
//! routes.
//!
//! ## Envelope
//!
//! ```json
//! { "event": "createFile", "data": { "fileName": "notes.txt", "encryptedText": "<base64>" } }
//! ```
//!
//! `data` may also be a JSON document encoded as a string, which is how
//! event-style clients usually emit it.
//!
//! ## Field Names
//!
//! Fields accept both camelCase names and the short legacy names
//! (`n`, `e`, `file_name`, `text`).

use base64ct::{Base64, Encoding};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::crypto::PublicKeyParams;

// =============================================================================
// Envelope
// =============================================================================

/// One inbound event frame.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventEnvelope {
    /// Event name (`login`, `logout`, `createFile`, `editFile`, `deleteFile`, `getFile`).
    pub event: String,
    /// Event payload; an object or a JSON string.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub data: Value,
}

impl EventEnvelope {
    /// The payload as a JSON value, unwrapping a string-encoded document.
    ///
    /// # Errors
    /// Returns the parse error if `data` is a string that is not valid JSON.
    pub fn payload(&self) -> Result<Value, serde_json::Error> {
        match &self.data {
            Value::String(raw) => serde_json::from_str(raw),
            other => Ok(other.clone()),
        }
    }
}

// =============================================================================
// Login
// =============================================================================

/// Credentials plus the RSA public key the session token is wrapped under.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    /// RSA modulus as a decimal string.
    #[serde(alias = "n", deserialize_with = "decimal_string")]
    pub public_key_modulus: String,
    /// RSA public exponent as a decimal string.
    #[serde(alias = "e", deserialize_with = "decimal_string")]
    pub public_key_exponent: String,
}

impl LoginRequest {
    pub fn public_key(&self) -> PublicKeyParams {
        PublicKeyParams::new(&self.public_key_modulus, &self.public_key_exponent)
    }
}

// =============================================================================
// Files
// =============================================================================

/// Create or edit a file.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileWriteRequest {
    #[serde(alias = "file_name")]
    pub file_name: String,
    /// Base64 of `iv || ciphertext`.
    #[serde(alias = "text", deserialize_with = "base64_bytes")]
    #[schema(value_type = String, format = Byte)]
    pub encrypted_text: Vec<u8>,
}

/// Read or delete a file.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileRequest {
    #[serde(alias = "file_name")]
    pub file_name: String,
}

// =============================================================================
// Field Decoders
// =============================================================================

/// Accept a decimal number either as a JSON string or a JSON integer.
fn decimal_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Decimal {
        Text(String),
        Number(u64),
    }

    Ok(match Decimal::deserialize(deserializer)? {
        Decimal::Text(text) => text,
        Decimal::Number(number) => number.to_string(),
    })
}

fn base64_bytes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let encoded = String::deserialize(deserializer)?;
    Base64::decode_vec(encoded.trim())
        .map_err(|_| serde::de::Error::custom("encryptedText is not valid base64"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_accepts_object_and_string_payloads() {
        let object: EventEnvelope =
            serde_json::from_value(json!({"event": "getFile", "data": {"fileName": "a"}})).unwrap();
        let string: EventEnvelope = serde_json::from_value(json!({
            "event": "getFile",
            "data": r#"{"fileName":"a"}"#,
        }))
        .unwrap();

        assert_eq!(object.payload().unwrap(), string.payload().unwrap());
    }

    #[test]
    fn envelope_without_data_is_null() {
        let envelope: EventEnvelope = serde_json::from_value(json!({"event": "logout"})).unwrap();
        assert_eq!(envelope.payload().unwrap(), Value::Null);
    }

    #[test]
    fn string_payload_that_is_not_json_fails() {
        let envelope: EventEnvelope =
            serde_json::from_value(json!({"event": "getFile", "data": "not json"})).unwrap();
        assert!(envelope.payload().is_err());
    }

    #[test]
    fn login_accepts_both_field_spellings() {
        let long: LoginRequest = serde_json::from_value(json!({
            "username": "user1",
            "password": "password1",
            "publicKeyModulus": "3233",
            "publicKeyExponent": "17"
        }))
        .unwrap();
        let short: LoginRequest = serde_json::from_value(json!({
            "username": "user1",
            "password": "password1",
            "n": "3233",
            "e": 17
        }))
        .unwrap();

        assert_eq!(long.public_key(), short.public_key());
        assert_eq!(short.public_key_exponent, "17");
    }

    #[test]
    fn file_write_decodes_base64() {
        let request: FileWriteRequest = serde_json::from_value(json!({
            "file_name": "notes.txt",
            "text": "AAECAw=="
        }))
        .unwrap();

        assert_eq!(request.file_name, "notes.txt");
        assert_eq!(request.encrypted_text, vec![0, 1, 2, 3]);
    }

    #[test]
    fn file_write_rejects_invalid_base64() {
        let result = serde_json::from_value::<FileWriteRequest>(json!({
            "fileName": "notes.txt",
            "encryptedText": "%%%"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn missing_field_is_rejected() {
        assert!(serde_json::from_value::<FileRequest>(json!({})).is_err());
        assert!(serde_json::from_value::<LoginRequest>(json!({"username": "user1"})).is_err());
    }
}
