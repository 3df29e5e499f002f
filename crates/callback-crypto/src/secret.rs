//! # Process-wide credentials
//!
//! The shared AES secret and the signing token. Both are loaded once at
//! startup and only ever read afterwards.

use crate::errors::{CallbackCryptoError, Result};
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use std::fmt;
use zeroize::Zeroize;

/// Size of the shared secret in bytes (AES-256 key).
pub const SECRET_LEN: usize = 32;

/// Size of the CBC initialization vector.
pub const IV_LEN: usize = 16;

/// Standard alphabet, tolerant of missing padding and non-canonical trailing
/// bits. Platform-issued keys are 43 characters and frequently end in a
/// character whose low bits are not zero.
pub(crate) const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// 32-byte AES key shared with the platform.
///
/// The first 16 bytes double as the CBC IV.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SharedSecret([u8; SECRET_LEN]);

impl SharedSecret {
    /// Create from raw bytes.
    pub fn from_bytes(bytes: [u8; SECRET_LEN]) -> Self {
        Self(bytes)
    }

    /// Derive from the platform's "encoding AES key" (base64 without padding).
    ///
    /// # Errors
    ///
    /// `Decode` if the string is not base64, `InvalidKey` if it does not
    /// decode to exactly 32 bytes.
    pub fn from_encoding_aes_key(encoded: &str) -> Result<Self> {
        let mut padded = encoded.trim().to_string();
        while padded.len() % 4 != 0 {
            padded.push('=');
        }

        let mut decoded = LENIENT.decode(padded.as_bytes())?;
        if decoded.len() != SECRET_LEN {
            let actual = decoded.len();
            decoded.zeroize();
            return Err(CallbackCryptoError::InvalidKey {
                expected: SECRET_LEN,
                actual,
            });
        }

        let mut bytes = [0u8; SECRET_LEN];
        bytes.copy_from_slice(&decoded);
        decoded.zeroize();
        Ok(Self(bytes))
    }

    /// Get inner bytes.
    pub fn as_bytes(&self) -> &[u8; SECRET_LEN] {
        &self.0
    }

    /// CBC IV: the leading 16 bytes of the key.
    pub fn iv(&self) -> [u8; IV_LEN] {
        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(&self.0[..IV_LEN]);
        iv
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(..)")
    }
}

/// Pre-shared token mixed into every callback signature.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    /// Wrap a token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Borrow the token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(..)")
    }
}

impl Drop for Token {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}
