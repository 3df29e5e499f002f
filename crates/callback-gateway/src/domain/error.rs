//! Gateway error types.
//!
//! [`HandshakeError`] is returned by the callback flows and maps to exactly one
//! HTTP status and body. The body texts are what the platform's console shows
//! to operators, so they are fixed strings.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Failure of a callback request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandshakeError {
    /// Signature did not match the request
    #[error("Signature verification failed")]
    SignatureMismatch,

    /// `echostr` was not base64
    #[error("Invalid base64 echostr")]
    InvalidBase64,

    /// Cipher, envelope, receive id or UTF-8 failure
    #[error("Decryption failed")]
    DecryptionFailed {
        /// Underlying cause, logged but never sent to the caller
        reason: String,
    },

    /// Request body or decrypted payload is not the expected XML
    #[error("Invalid message format")]
    InvalidMessage {
        /// Parser message, logged but never sent to the caller
        reason: String,
    },

    /// Anything else; the text is returned as the body
    #[error("{0}")]
    Unexpected(String),
}

impl HandshakeError {
    /// HTTP status used on the encrypted routes.
    pub fn status(&self) -> StatusCode {
        match self {
            HandshakeError::SignatureMismatch => StatusCode::FORBIDDEN,
            HandshakeError::InvalidBase64
            | HandshakeError::DecryptionFailed { .. }
            | HandshakeError::InvalidMessage { .. } => StatusCode::BAD_REQUEST,
            HandshakeError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            HandshakeError::SignatureMismatch => "signature_mismatch",
            HandshakeError::InvalidBase64 => "invalid_base64",
            HandshakeError::DecryptionFailed { .. } => "decryption_failed",
            HandshakeError::InvalidMessage { .. } => "invalid_message",
            HandshakeError::Unexpected(_) => "unexpected",
        }
    }
}

impl IntoResponse for HandshakeError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

/// Result alias for the callback flows.
pub type HandshakeResult<T> = Result<T, HandshakeError>;

/// Gateway-level errors (startup and serving, internal use)
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),

    /// Server socket bind error
    #[error("server bind error: {0}")]
    Bind(String),

    /// Server already running
    #[error("server already started")]
    AlreadyStarted,

    /// Internal server error
    #[error("internal error: {0}")]
    Internal(String),
}
