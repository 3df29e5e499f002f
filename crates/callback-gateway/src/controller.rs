//! Callback handshake and message flows.
//!
//! The controller holds only immutable credentials and a metrics handle, so a
//! single instance is shared by every request.
//!
//! | Flow | Signature covers | Payload |
//! |------|------------------|---------|
//! | plain verify | token, timestamp, nonce | `echostr` returned as is |
//! | encrypted verify | token, timestamp, nonce, `echostr` | `echostr` decrypted |
//! | plain receive | not signed | XML body, passive reply |
//! | encrypted receive | token, timestamp, nonce, `Encrypt` | `Encrypt` decrypted |

use crate::domain::config::{ConfigError, CredentialsConfig};
use crate::domain::error::{HandshakeError, HandshakeResult};
use crate::domain::message::{
    render_text_reply, EncryptedBody, InboundMessage, SealedReply, TEXT_REPLY_PREFIX,
    VOICE_REPLY_PREFIX, VOICE_UNRECOGNIZED_REPLY,
};
use crate::domain::types::{EncryptedQuery, PlainQuery};
use crate::middleware::CallbackMetrics;
use callback_crypto::{
    decode_cipher_text, CallbackCryptoError, EnvelopeCipher, SignatureVerifier, Token,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Body acknowledging a message without replying.
pub const ACK_BODY: &str = "success";

/// Body of a plain-mode GET without parameters.
pub const GREETING_BODY: &str = "hello, this is handle view";

/// Outcome of a plain-mode message POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlainReply {
    /// Passive reply document
    Xml(String),
    /// Plain acknowledgement
    Ack,
}

/// Verifies and decrypts platform callbacks.
#[derive(Debug)]
pub struct CallbackHandshakeController {
    verifier: SignatureVerifier,
    cipher: EnvelopeCipher,
    receive_id: String,
    metrics: Arc<CallbackMetrics>,
}

impl CallbackHandshakeController {
    /// Create a controller from prepared primitives.
    ///
    /// `receive_id` is stamped into sealed replies.
    pub fn new(
        verifier: SignatureVerifier,
        cipher: EnvelopeCipher,
        receive_id: impl Into<String>,
        metrics: Arc<CallbackMetrics>,
    ) -> Self {
        Self {
            verifier,
            cipher,
            receive_id: receive_id.into(),
            metrics,
        }
    }

    /// Build from configured credentials. Padding fallbacks are counted in
    /// `metrics`.
    pub fn from_credentials(
        credentials: &CredentialsConfig,
        metrics: Arc<CallbackMetrics>,
    ) -> Result<Self, ConfigError> {
        let secret = credentials.shared_secret()?;
        let mut cipher = EnvelopeCipher::new(secret).with_padding_observer(metrics.clone());

        let receive_id = credentials.receive_id.clone().unwrap_or_default();
        if credentials.verify_receive_id {
            if receive_id.is_empty() {
                return Err(ConfigError::MissingReceiveId);
            }
            cipher = cipher.with_receive_id_check(receive_id.clone());
        }

        Ok(Self::new(
            SignatureVerifier::new(Token::new(credentials.token.clone())),
            cipher,
            receive_id,
            metrics,
        ))
    }

    /// Shared metrics handle.
    pub fn metrics(&self) -> &Arc<CallbackMetrics> {
        &self.metrics
    }

    /// Plain-mode handshake.
    ///
    /// Returns `echostr` on a match and an empty body on a mismatch. An absent
    /// `signature` is a mismatch. A missing `timestamp` or `nonce`, or a
    /// missing `echostr` on a match, is an `Unexpected` error.
    pub fn verify_plain(&self, query: &PlainQuery) -> HandshakeResult<String> {
        let timestamp = required(&query.timestamp, "timestamp")?;
        let nonce = required(&query.nonce, "nonce")?;
        let signature = query.signature.as_deref().unwrap_or_default();

        if self.verifier.verify(signature, timestamp, nonce, None) {
            let echostr = required(&query.echostr, "echostr")?;
            info!(timestamp, "Plain handshake verified");
            self.metrics.record_plain_handshake();
            Ok(echostr.to_string())
        } else {
            warn!(timestamp, "Plain handshake signature mismatch");
            self.metrics.record_signature_failure();
            Ok(String::new())
        }
    }

    /// Encrypted-mode handshake: verify, then decrypt `echostr`.
    pub fn verify_encrypted(&self, query: &EncryptedQuery) -> HandshakeResult<String> {
        let result = self.open_encrypted_echo(query);
        match &result {
            Ok(_) => {
                info!(timestamp = query.timestamp(), "Encrypted handshake verified");
                self.metrics.record_encrypted_handshake();
            }
            Err(e) => self.metrics.record_failure(e),
        }
        result
    }

    fn open_encrypted_echo(&self, query: &EncryptedQuery) -> HandshakeResult<String> {
        let echostr = query.echostr();
        if !self.verifier.verify(
            query.msg_signature(),
            query.timestamp(),
            query.nonce(),
            Some(echostr),
        ) {
            warn!(timestamp = query.timestamp(), "Encrypted handshake signature mismatch");
            return Err(HandshakeError::SignatureMismatch);
        }

        let raw = decode_cipher_text(echostr).map_err(|e| {
            warn!(error = %e, "echostr is not base64");
            HandshakeError::InvalidBase64
        })?;

        let message = self.cipher.decrypt_bytes(&raw).map_err(decryption_failed)?;
        utf8(message)
    }

    /// Plain-mode message POST.
    ///
    /// Never fails: anything that cannot be answered is acknowledged.
    pub fn receive_plain(&self, body: &str) -> PlainReply {
        if body.trim().is_empty() {
            warn!("Empty message body");
            return PlainReply::Ack;
        }

        let message = match InboundMessage::from_xml(body) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "Unparsable message body");
                self.metrics.record_failure(&HandshakeError::InvalidMessage {
                    reason: e.to_string(),
                });
                return PlainReply::Ack;
            }
        };

        self.metrics.record_message();
        info!(summary = %message.summary(), "Plain message received");

        let content = match message.msg_type.as_deref() {
            Some("text") => format!(
                "{}{}",
                TEXT_REPLY_PREFIX,
                message.content.as_deref().unwrap_or_default()
            ),
            Some("voice") => match message.recognition.as_deref() {
                Some(text) if !text.is_empty() => format!("{VOICE_REPLY_PREFIX}{text}"),
                _ => {
                    debug!("Voice message without recognition result");
                    VOICE_UNRECOGNIZED_REPLY.to_string()
                }
            },
            _ => return PlainReply::Ack,
        };

        self.metrics.record_reply();
        PlainReply::Xml(render_text_reply(
            message.from_user_name.as_deref().unwrap_or_default(),
            message.to_user_name.as_deref().unwrap_or_default(),
            chrono::Utc::now().timestamp(),
            &content,
        ))
    }

    /// Encrypted-mode message POST: parse, verify, decrypt, parse again.
    pub fn receive_encrypted(
        &self,
        query: &EncryptedQuery,
        body: &str,
    ) -> HandshakeResult<InboundMessage> {
        let result = self.open_encrypted_message(query, body);
        match &result {
            Ok(message) => {
                info!(summary = %message.summary(), "Encrypted message received");
                debug!(content = ?message.content, "Message content");
                self.metrics.record_message();
            }
            Err(e) => self.metrics.record_failure(e),
        }
        result
    }

    fn open_encrypted_message(
        &self,
        query: &EncryptedQuery,
        body: &str,
    ) -> HandshakeResult<InboundMessage> {
        let outer = EncryptedBody::from_xml(body).map_err(invalid_message)?;

        if !self.verifier.verify(
            query.msg_signature(),
            query.timestamp(),
            query.nonce(),
            Some(&outer.encrypt),
        ) {
            warn!(timestamp = query.timestamp(), "Message signature mismatch");
            return Err(HandshakeError::SignatureMismatch);
        }

        let envelope = self.cipher.open(&outer.encrypt).map_err(decryption_failed)?;
        debug!(
            receive_id = %String::from_utf8_lossy(&envelope.receive_id),
            agent_id = ?outer.agent_id,
            "Message envelope opened"
        );

        let inner = utf8(envelope.message)?;
        InboundMessage::from_xml(&inner).map_err(invalid_message)
    }

    /// Encrypt and sign a passive reply.
    pub fn seal_reply(
        &self,
        reply_xml: &str,
        timestamp: &str,
        nonce: &str,
    ) -> HandshakeResult<SealedReply> {
        let encrypt = self
            .cipher
            .encrypt(reply_xml.as_bytes(), &self.receive_id)
            .map_err(|e| HandshakeError::Unexpected(e.to_string()))?;
        let msg_signature = self.verifier.sign(timestamp, nonce, Some(&encrypt));

        self.metrics.record_reply();
        Ok(SealedReply {
            encrypt,
            msg_signature,
            timestamp: timestamp.to_string(),
            nonce: nonce.to_string(),
        })
    }
}

fn required<'a>(value: &'a Option<String>, name: &str) -> HandshakeResult<&'a str> {
    value
        .as_deref()
        .ok_or_else(|| HandshakeError::Unexpected(format!("missing parameter: {name}")))
}

fn decryption_failed(error: CallbackCryptoError) -> HandshakeError {
    warn!(error = %error, "Decryption failed");
    HandshakeError::DecryptionFailed {
        reason: error.to_string(),
    }
}

fn invalid_message(error: quick_xml::DeError) -> HandshakeError {
    warn!(error = %error, "Invalid message document");
    HandshakeError::InvalidMessage {
        reason: error.to_string(),
    }
}

fn utf8(bytes: Vec<u8>) -> HandshakeResult<String> {
    String::from_utf8(bytes).map_err(|e| {
        warn!(error = %e, "Decrypted message is not UTF-8");
        HandshakeError::DecryptionFailed {
            reason: e.to_string(),
        }
    })
}
