//! Crypto error types.

use thiserror::Error;

/// Errors raised while verifying or opening a callback envelope.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CallbackCryptoError {
    /// Input was not valid base64
    #[error("Invalid base64: {0}")]
    Decode(String),

    /// Block cipher failure (misaligned ciphertext, bad key/IV)
    #[error("Cipher failure: {0}")]
    Crypto(String),

    /// Declared message length does not fit the decrypted buffer
    #[error("Malformed envelope: declared {declared} bytes, {available} available")]
    MalformedEnvelope {
        /// Length read from the envelope header
        declared: usize,
        /// Bytes actually present after the header
        available: usize,
    },

    /// Envelope was addressed to a different receiver
    #[error("Receive id mismatch: expected {expected}, got {actual}")]
    ReceiveIdMismatch {
        /// Configured receive id
        expected: String,
        /// Receive id found in the envelope (lossy UTF-8)
        actual: String,
    },

    /// Shared secret did not decode to 32 bytes
    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKey {
        /// Expected key length in bytes
        expected: usize,
        /// Actual key length in bytes
        actual: usize,
    },
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, CallbackCryptoError>;

impl From<base64::DecodeError> for CallbackCryptoError {
    fn from(e: base64::DecodeError) -> Self {
        CallbackCryptoError::Decode(e.to_string())
    }
}
