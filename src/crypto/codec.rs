// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! AES-CBC payload codec.
//!
//! Every file payload travels as `iv || ciphertext`. The IV is drawn from the
//! OS random source on each call, so encoding the same plaintext twice under
//! the same key yields different blobs.
//!
//! The key is derived from the session token: `SHA-256(token)` truncated to
//! the configured AES key size.

use aes::cipher::{
    block_padding::{NoPadding, Pkcs7},
    BlockDecryptMut, BlockEncryptMut, KeyIvInit,
};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

use super::CryptoError;

/// AES block size in bytes. Also the IV length.
pub const BLOCK_SIZE: usize = 16;

/// AES key size used for payload encryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeySize {
    Aes128,
    Aes192,
    #[default]
    Aes256,
}

impl KeySize {
    /// Key length in bytes.
    pub fn key_len(self) -> usize {
        match self {
            KeySize::Aes128 => 16,
            KeySize::Aes192 => 24,
            KeySize::Aes256 => 32,
        }
    }

    /// Parse from a key size in bits (`128`, `192` or `256`).
    pub fn from_bits(bits: u32) -> Option<KeySize> {
        match bits {
            128 => Some(KeySize::Aes128),
            192 => Some(KeySize::Aes192),
            256 => Some(KeySize::Aes256),
            _ => None,
        }
    }
}

/// Padding applied to plaintext before encryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Padding {
    /// Plaintext must already be block aligned.
    #[default]
    None,
    /// PKCS#7 padding; any plaintext length is accepted.
    Pkcs7,
}

impl Padding {
    /// Parse from a configuration value (`none` or `pkcs7`, case-insensitive).
    pub fn from_name(name: &str) -> Option<Padding> {
        match name.to_ascii_lowercase().as_str() {
            "none" => Some(Padding::None),
            "pkcs7" => Some(Padding::Pkcs7),
            _ => None,
        }
    }
}

/// Symmetric key material derived from a session secret.
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey(Vec<u8>);

impl SymmetricKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SymmetricKey({} bytes, redacted)", self.0.len())
    }
}

/// AES-CBC encoder/decoder for session payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymmetricCodec {
    key_size: KeySize,
    padding: Padding,
}

impl SymmetricCodec {
    pub fn new(key_size: KeySize, padding: Padding) -> Self {
        Self { key_size, padding }
    }

    /// Derive the AES key for a session secret.
    pub fn derive_key(&self, secret: &[u8]) -> SymmetricKey {
        let digest = Sha256::digest(secret);
        SymmetricKey(digest[..self.key_size.key_len()].to_vec())
    }

    /// Encrypt `plaintext`, returning `iv || ciphertext`.
    ///
    /// # Errors
    /// - `CryptoError::Misaligned` when padding is disabled and the plaintext
    ///   is not a multiple of [`BLOCK_SIZE`]
    /// - `CryptoError::InvalidKeyLength` if the key does not match the key size
    pub fn encode(&self, key: &SymmetricKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if self.padding == Padding::None && plaintext.len() % BLOCK_SIZE != 0 {
            return Err(CryptoError::Misaligned(plaintext.len()));
        }
        self.check_key(key)?;

        let mut iv = [0u8; BLOCK_SIZE];
        OsRng.fill_bytes(&mut iv);

        let key = key.as_bytes();
        let ciphertext = match self.key_size {
            KeySize::Aes128 => {
                encrypt::<cbc::Encryptor<aes::Aes128>>(key, &iv, plaintext, self.padding)?
            }
            KeySize::Aes192 => {
                encrypt::<cbc::Encryptor<aes::Aes192>>(key, &iv, plaintext, self.padding)?
            }
            KeySize::Aes256 => {
                encrypt::<cbc::Encryptor<aes::Aes256>>(key, &iv, plaintext, self.padding)?
            }
        };

        let mut blob = Vec::with_capacity(BLOCK_SIZE + ciphertext.len());
        blob.extend_from_slice(&iv);
        blob.extend_from_slice(&ciphertext);
        Ok(blob)
    }

    /// Split `iv || ciphertext` and decrypt.
    ///
    /// # Errors
    /// - `CryptoError::TooShort` if the blob cannot hold an IV
    /// - `CryptoError::Misaligned` if the ciphertext is not block aligned
    /// - `CryptoError::Padding` if PKCS#7 padding is enabled and invalid
    pub fn decode(&self, key: &SymmetricKey, blob: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if blob.len() < BLOCK_SIZE {
            return Err(CryptoError::TooShort);
        }
        let (iv, ciphertext) = blob.split_at(BLOCK_SIZE);
        if ciphertext.len() % BLOCK_SIZE != 0 {
            return Err(CryptoError::Misaligned(ciphertext.len()));
        }
        self.check_key(key)?;

        match self.key_size {
            KeySize::Aes128 => {
                decrypt::<cbc::Decryptor<aes::Aes128>>(key.as_bytes(), iv, ciphertext, self.padding)
            }
            KeySize::Aes192 => {
                decrypt::<cbc::Decryptor<aes::Aes192>>(key.as_bytes(), iv, ciphertext, self.padding)
            }
            KeySize::Aes256 => {
                decrypt::<cbc::Decryptor<aes::Aes256>>(key.as_bytes(), iv, ciphertext, self.padding)
            }
        }
    }

    fn check_key(&self, key: &SymmetricKey) -> Result<(), CryptoError> {
        if key.as_bytes().len() == self.key_size.key_len() {
            Ok(())
        } else {
            Err(CryptoError::InvalidKeyLength)
        }
    }
}

fn encrypt<C>(
    key: &[u8],
    iv: &[u8],
    plaintext: &[u8],
    padding: Padding,
) -> Result<Vec<u8>, CryptoError>
where
    C: BlockEncryptMut + KeyIvInit,
{
    let cipher = C::new_from_slices(key, iv).map_err(|_| CryptoError::InvalidKeyLength)?;
    Ok(match padding {
        Padding::None => cipher.encrypt_padded_vec_mut::<NoPadding>(plaintext),
        Padding::Pkcs7 => cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext),
    })
}

fn decrypt<C>(
    key: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
    padding: Padding,
) -> Result<Vec<u8>, CryptoError>
where
    C: BlockDecryptMut + KeyIvInit,
{
    let cipher = C::new_from_slices(key, iv).map_err(|_| CryptoError::InvalidKeyLength)?;
    match padding {
        Padding::None => cipher
            .decrypt_padded_vec_mut::<NoPadding>(ciphertext)
            .map_err(|_| CryptoError::Misaligned(ciphertext.len())),
        Padding::Pkcs7 => cipher
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| CryptoError::Padding),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &[u8] = b"3f2b8c1e-9d4a-4e7b-a1c2-5f6e7d8c9b0a";

    fn codec() -> SymmetricCodec {
        SymmetricCodec::default()
    }

    #[test]
    fn encode_then_decode_returns_plaintext() {
        let codec = codec();
        let key = codec.derive_key(TOKEN);
        let plaintext = b"exactly 32 bytes of file content";

        let blob = codec.encode(&key, plaintext).unwrap();
        assert_eq!(blob.len(), BLOCK_SIZE + plaintext.len());
        assert_eq!(codec.decode(&key, &blob).unwrap(), plaintext);
    }

    #[test]
    fn encode_uses_fresh_iv_every_call() {
        let codec = codec();
        let key = codec.derive_key(TOKEN);
        let plaintext = [7u8; 48];

        let first = codec.encode(&key, &plaintext).unwrap();
        let second = codec.encode(&key, &plaintext).unwrap();

        assert_ne!(first, second);
        assert_ne!(first[..BLOCK_SIZE], second[..BLOCK_SIZE]);
        assert_eq!(codec.decode(&key, &first).unwrap(), plaintext);
        assert_eq!(codec.decode(&key, &second).unwrap(), plaintext);
    }

    #[test]
    fn empty_plaintext_encodes_to_bare_iv() {
        let codec = codec();
        let key = codec.derive_key(TOKEN);

        let blob = codec.encode(&key, b"").unwrap();
        assert_eq!(blob.len(), BLOCK_SIZE);
        assert!(codec.decode(&key, &blob).unwrap().is_empty());
    }

    #[test]
    fn encode_rejects_misaligned_plaintext_without_padding() {
        let codec = codec();
        let key = codec.derive_key(TOKEN);

        let err = codec.encode(&key, b"not aligned").unwrap_err();
        assert_eq!(err, CryptoError::Misaligned(11));
    }

    #[test]
    fn decode_rejects_blob_shorter_than_iv() {
        let codec = codec();
        let key = codec.derive_key(TOKEN);

        assert_eq!(codec.decode(&key, &[0u8; 15]).unwrap_err(), CryptoError::TooShort);
    }

    #[test]
    fn decode_rejects_misaligned_ciphertext() {
        let codec = codec();
        let key = codec.derive_key(TOKEN);

        let err = codec.decode(&key, &[0u8; BLOCK_SIZE + 5]).unwrap_err();
        assert_eq!(err, CryptoError::Misaligned(5));
    }

    #[test]
    fn tampered_ciphertext_decodes_without_error() {
        let codec = codec();
        let key = codec.derive_key(TOKEN);
        let plaintext = [0x41u8; 32];

        let mut blob = codec.encode(&key, &plaintext).unwrap();
        blob[BLOCK_SIZE] ^= 0xff;

        let decoded = codec.decode(&key, &blob).unwrap();
        assert_eq!(decoded.len(), plaintext.len());
        assert_ne!(decoded, plaintext);
    }

    #[test]
    fn wrong_key_does_not_recover_plaintext() {
        let codec = codec();
        let plaintext = [0x42u8; 16];
        let blob = codec.encode(&codec.derive_key(TOKEN), &plaintext).unwrap();

        let other = codec.derive_key(b"another-token");
        assert_ne!(codec.decode(&other, &blob).unwrap(), plaintext);
    }

    #[test]
    fn derived_key_length_follows_key_size() {
        for (size, len) in [
            (KeySize::Aes128, 16),
            (KeySize::Aes192, 24),
            (KeySize::Aes256, 32),
        ] {
            let codec = SymmetricCodec::new(size, Padding::None);
            let key = codec.derive_key(TOKEN);
            assert_eq!(key.as_bytes().len(), len);

            let blob = codec.encode(&key, &[1u8; 16]).unwrap();
            assert_eq!(codec.decode(&key, &blob).unwrap(), [1u8; 16]);
        }
    }

    #[test]
    fn key_of_wrong_size_is_rejected() {
        let aes128 = SymmetricCodec::new(KeySize::Aes128, Padding::None);
        let key = codec().derive_key(TOKEN);

        assert_eq!(
            aes128.encode(&key, &[0u8; 16]).unwrap_err(),
            CryptoError::InvalidKeyLength
        );
    }

    #[test]
    fn pkcs7_accepts_any_length() {
        let codec = SymmetricCodec::new(KeySize::Aes256, Padding::Pkcs7);
        let key = codec.derive_key(TOKEN);
        let plaintext = b"hello, sandbox";

        let blob = codec.encode(&key, plaintext).unwrap();
        assert_eq!(blob.len(), 2 * BLOCK_SIZE);
        assert_eq!(codec.decode(&key, &blob).unwrap(), plaintext);
    }

    #[test]
    fn pkcs7_rejects_bad_padding() {
        let strict = SymmetricCodec::new(KeySize::Aes256, Padding::None);
        let padded = SymmetricCodec::new(KeySize::Aes256, Padding::Pkcs7);
        let key = strict.derive_key(TOKEN);

        // Last plaintext byte 0x00 is never valid PKCS#7.
        let blob = strict.encode(&key, &[0u8; 16]).unwrap();
        assert_eq!(padded.decode(&key, &blob).unwrap_err(), CryptoError::Padding);
    }

    #[test]
    fn parses_config_values() {
        assert_eq!(KeySize::from_bits(192), Some(KeySize::Aes192));
        assert_eq!(KeySize::from_bits(64), None);
        assert_eq!(Padding::from_name("PKCS7"), Some(Padding::Pkcs7));
        assert_eq!(Padding::from_name("none"), Some(Padding::None));
        assert_eq!(Padding::from_name("zero"), None);
    }

    #[test]
    fn key_debug_is_redacted() {
        let key = codec().derive_key(TOKEN);
        assert_eq!(format!("{key:?}"), "SymmetricKey(32 bytes, redacted)");
    }
}
