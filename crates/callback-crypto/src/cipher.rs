//! # Envelope Cipher
//!
//! AES-256-CBC over the framed envelope, keyed by the shared secret with the
//! first 16 key bytes reused as IV.
//!
//! ## Decrypt
//!
//! 1. base64 decode
//! 2. CBC decrypt without automatic padding (length must be a positive
//!    multiple of 16)
//! 3. strip padding per the trailing byte; out-of-range values strip nothing
//! 4. split nonce / length / message / receive id
//!
//! ## Encrypt
//!
//! Fresh 16-byte nonce from the thread-local CSPRNG, framing, PKCS padding to
//! 16, CBC encrypt, base64 encode.

use crate::envelope::{Envelope, NONCE_LEN};
use crate::errors::{CallbackCryptoError, Result};
use crate::padding::{self, PaddingObserver, BLOCK_SIZE};
use crate::secret::{SharedSecret, LENIENT};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use cbc::cipher::{block_padding::NoPadding, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Decode base64 ciphertext the way the platform emits it: surrounding
/// whitespace trimmed, padding optional, non-canonical trailing bits allowed.
///
/// # Errors
///
/// `Decode` on characters outside the standard alphabet.
pub fn decode_cipher_text(cipher_text_b64: &str) -> Result<Vec<u8>> {
    Ok(LENIENT.decode(cipher_text_b64.trim().as_bytes())?)
}

/// Stateless envelope cipher.
///
/// Safe to share across threads; nothing is mutated after construction.
#[derive(Clone)]
pub struct EnvelopeCipher {
    secret: SharedSecret,
    expected_receive_id: Option<String>,
    padding_observer: Option<Arc<dyn PaddingObserver>>,
}

impl EnvelopeCipher {
    /// Create a cipher over `secret`. The receive id is not checked.
    pub fn new(secret: SharedSecret) -> Self {
        Self {
            secret,
            expected_receive_id: None,
            padding_observer: None,
        }
    }

    /// Reject envelopes whose trailing identifier differs from `receive_id`.
    pub fn with_receive_id_check(mut self, receive_id: impl Into<String>) -> Self {
        self.expected_receive_id = Some(receive_id.into());
        self
    }

    /// Report lenient-unpadding events to `observer`.
    pub fn with_padding_observer(mut self, observer: Arc<dyn PaddingObserver>) -> Self {
        self.padding_observer = Some(observer);
        self
    }

    /// Encrypt `message` addressed to `receive_id`.
    ///
    /// # Errors
    ///
    /// `Crypto` if the block cipher rejects the buffer (not expected with
    /// correct padding), `MalformedEnvelope` if the message exceeds u32.
    pub fn encrypt(&self, message: &[u8], receive_id: &str) -> Result<String> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut nonce);
        self.encrypt_with_nonce(nonce, message, receive_id)
    }

    /// Encrypt with a caller-chosen nonce. Deterministic; meant for fixtures.
    pub fn encrypt_with_nonce(
        &self,
        nonce: [u8; NONCE_LEN],
        message: &[u8],
        receive_id: &str,
    ) -> Result<String> {
        let envelope = Envelope {
            nonce,
            message: message.to_vec(),
            receive_id: receive_id.as_bytes().to_vec(),
        };

        let mut buf = envelope.encode()?;
        padding::pad(&mut buf);
        let len = buf.len();

        let key = self.secret.as_bytes();
        let iv = self.secret.iv();
        Aes256CbcEnc::new(key.into(), &iv.into())
            .encrypt_padded_mut::<NoPadding>(&mut buf, len)
            .map_err(|e| CallbackCryptoError::Crypto(e.to_string()))?;

        Ok(STANDARD.encode(&buf))
    }

    /// Decrypt a base64 ciphertext and return the message bytes.
    ///
    /// # Errors
    ///
    /// `Decode`, `Crypto`, `MalformedEnvelope`, or `ReceiveIdMismatch` when a
    /// receive id check is configured.
    pub fn decrypt(&self, cipher_text_b64: &str) -> Result<Vec<u8>> {
        Ok(self.open(cipher_text_b64)?.message)
    }

    /// Decrypt already base64-decoded ciphertext.
    pub fn decrypt_bytes(&self, cipher_text: &[u8]) -> Result<Vec<u8>> {
        Ok(self.open_bytes(cipher_text)?.message)
    }

    /// Decrypt a base64 ciphertext into the full envelope.
    pub fn open(&self, cipher_text_b64: &str) -> Result<Envelope> {
        let raw = decode_cipher_text(cipher_text_b64)?;
        self.open_bytes(&raw)
    }

    /// Decrypt raw ciphertext into the full envelope.
    pub fn open_bytes(&self, cipher_text: &[u8]) -> Result<Envelope> {
        if cipher_text.is_empty() || cipher_text.len() % BLOCK_SIZE != 0 {
            return Err(CallbackCryptoError::Crypto(format!(
                "ciphertext length {} is not a positive multiple of {}",
                cipher_text.len(),
                BLOCK_SIZE
            )));
        }

        let mut buf = cipher_text.to_vec();
        let key = self.secret.as_bytes();
        let iv = self.secret.iv();
        let plain_len = Aes256CbcDec::new(key.into(), &iv.into())
            .decrypt_padded_mut::<NoPadding>(&mut buf)
            .map_err(|e| CallbackCryptoError::Crypto(e.to_string()))?
            .len();
        buf.truncate(plain_len);

        let strip = padding::unpad_len(&buf, self.padding_observer.as_deref());
        buf.truncate(buf.len() - strip);

        let envelope = Envelope::decode(&buf)?;
        debug!(
            message_len = envelope.message.len(),
            receive_id_len = envelope.receive_id.len(),
            "Envelope opened"
        );

        if let Some(expected) = &self.expected_receive_id {
            if envelope.receive_id != expected.as_bytes() {
                return Err(CallbackCryptoError::ReceiveIdMismatch {
                    expected: expected.clone(),
                    actual: String::from_utf8_lossy(&envelope.receive_id).into_owned(),
                });
            }
        }

        Ok(envelope)
    }
}

impl fmt::Debug for EnvelopeCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvelopeCipher")
            .field("secret", &self.secret)
            .field("expected_receive_id", &self.expected_receive_id)
            .field("padding_observer", &self.padding_observer.is_some())
            .finish()
    }
}
