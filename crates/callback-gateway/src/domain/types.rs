//! Request query types.
//!
//! Parameter names are fixed by the platform and must match exactly. Every
//! field is optional so that extraction never fails on a missing parameter;
//! each flow decides what absence means.

use serde::Deserialize;

/// Query of a plain-mode callback.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct PlainQuery {
    /// SHA-1 over token, timestamp and nonce
    pub signature: Option<String>,
    /// Platform timestamp (opaque)
    pub timestamp: Option<String>,
    /// Platform nonce (opaque)
    pub nonce: Option<String>,
    /// Echo string returned on success
    pub echostr: Option<String>,
}

/// Query of an encrypted-mode callback.
///
/// `echostr` is only present on the GET handshake.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct EncryptedQuery {
    /// SHA-1 over token, timestamp, nonce and the ciphertext
    pub msg_signature: Option<String>,
    /// Platform timestamp (opaque)
    pub timestamp: Option<String>,
    /// Platform nonce (opaque)
    pub nonce: Option<String>,
    /// Base64 ciphertext of the echo string
    pub echostr: Option<String>,
}

impl EncryptedQuery {
    /// `msg_signature`, or empty.
    pub fn msg_signature(&self) -> &str {
        self.msg_signature.as_deref().unwrap_or_default()
    }

    /// `timestamp`, or empty.
    pub fn timestamp(&self) -> &str {
        self.timestamp.as_deref().unwrap_or_default()
    }

    /// `nonce`, or empty.
    pub fn nonce(&self) -> &str {
        self.nonce.as_deref().unwrap_or_default()
    }

    /// `echostr`, or empty.
    pub fn echostr(&self) -> &str {
        self.echostr.as_deref().unwrap_or_default()
    }
}
