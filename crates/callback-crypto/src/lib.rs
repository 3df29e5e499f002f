//! # Callback Crypto - Webhook Verification Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `signature` | SHA-1 over sorted inputs | Callback authenticity |
//! | `cipher` | AES-256-CBC | Envelope encrypt/decrypt |
//! | `envelope` | nonce + BE length + message + id | Plaintext framing |
//! | `padding` | PKCS-style, block 16 | Block alignment |
//! | `secret` | base64 key, token | Process-wide credentials |
//!
//! ## Security Properties
//!
//! - **Signatures**: compared in constant time
//! - **Nonces**: drawn per call from the thread-local CSPRNG, no shared state
//! - **Keys**: zeroized on drop, redacted from `Debug`
//!
//! The IV is the first half of the key. That is fixed by the wire protocol
//! and must not be copied into new designs.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cipher;
pub mod envelope;
pub mod errors;
pub mod padding;
pub mod secret;
pub mod signature;

// Re-exports
pub use cipher::{decode_cipher_text, EnvelopeCipher};
pub use envelope::Envelope;
pub use errors::{CallbackCryptoError, Result};
pub use padding::PaddingObserver;
pub use secret::{SharedSecret, Token};
pub use signature::{compute_signature, signatures_match, SignatureVerifier};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
