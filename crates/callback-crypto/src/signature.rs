//! # Callback Signatures
//!
//! SHA-1 over the sorted concatenation of token, timestamp, nonce and
//! (for encrypted callbacks) the ciphertext.
//!
//! ## Properties
//!
//! - Order of the inputs does not matter: they are sorted byte-wise first
//! - An absent extra element is never signed as an empty string
//! - Comparison against the supplied signature is constant-time

use crate::secret::Token;
use sha1::{Digest, Sha1};
use subtle::ConstantTimeEq;

/// Hex-encoded SHA-1 length.
pub const SIGNATURE_HEX_LEN: usize = 40;

/// Compute the lowercase hex SHA-1 of the byte-wise sorted concatenation of
/// `parts`.
pub fn compute_signature(parts: &[&str]) -> String {
    let mut sorted: Vec<&str> = parts.to_vec();
    sorted.sort_unstable();

    let mut hasher = Sha1::new();
    for part in &sorted {
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Compare two signature strings without leaking the mismatch position.
pub fn signatures_match(expected: &str, supplied: &str) -> bool {
    if expected.len() != supplied.len() {
        return false;
    }
    expected.as_bytes().ct_eq(supplied.as_bytes()).into()
}

/// Stateless verifier bound to the process-wide token.
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    token: Token,
}

impl SignatureVerifier {
    /// Create a verifier for `token`.
    pub fn new(token: Token) -> Self {
        Self { token }
    }

    /// Signature the platform is expected to send for these inputs.
    pub fn sign(&self, timestamp: &str, nonce: &str, extra: Option<&str>) -> String {
        match extra {
            Some(extra) => compute_signature(&[self.token.as_str(), timestamp, nonce, extra]),
            None => compute_signature(&[self.token.as_str(), timestamp, nonce]),
        }
    }

    /// Check `signature` against the inputs.
    pub fn verify(
        &self,
        signature: &str,
        timestamp: &str,
        nonce: &str,
        extra: Option<&str>,
    ) -> bool {
        let expected = self.sign(timestamp, nonce, extra);
        signatures_match(&expected, signature)
    }
}
