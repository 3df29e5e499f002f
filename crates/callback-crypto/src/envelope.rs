//! Plaintext envelope framing.

use crate::errors::{CallbackCryptoError, Result};

/// Random prefix length.
pub const NONCE_LEN: usize = 16;

/// Big-endian message length field.
pub const LENGTH_FIELD_LEN: usize = 4;

/// Fixed header: nonce + length.
pub const HEADER_LEN: usize = NONCE_LEN + LENGTH_FIELD_LEN;

/// Decoded envelope contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Random prefix (ignored by the receiver).
    pub nonce: [u8; NONCE_LEN],
    /// Message payload.
    pub message: Vec<u8>,
    /// Sender/receiver identifier trailing the message.
    pub receive_id: Vec<u8>,
}

impl Envelope {
    /// Encode the envelope to unpadded bytes.
    ///
    /// Format:
    /// - [0-15]    nonce
    /// - [16-19]   message length (u32, big-endian)
    /// - [20..]    message
    /// - [..]      receive id
    ///
    /// # Errors
    ///
    /// `MalformedEnvelope` if the message does not fit a u32 length.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let len = u32::try_from(self.message.len()).map_err(|_| {
            CallbackCryptoError::MalformedEnvelope {
                declared: self.message.len(),
                available: u32::MAX as usize,
            }
        })?;

        let mut data =
            Vec::with_capacity(HEADER_LEN + self.message.len() + self.receive_id.len());
        data.extend_from_slice(&self.nonce);
        data.extend_from_slice(&len.to_be_bytes());
        data.extend_from_slice(&self.message);
        data.extend_from_slice(&self.receive_id);
        Ok(data)
    }

    /// Decode unpadded plaintext into an envelope.
    ///
    /// # Errors
    ///
    /// `MalformedEnvelope` if the header is truncated or the declared length
    /// runs past the end of `data`.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(CallbackCryptoError::MalformedEnvelope {
                declared: HEADER_LEN,
                available: data.len(),
            });
        }

        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&data[..NONCE_LEN]);

        let mut len_bytes = [0u8; LENGTH_FIELD_LEN];
        len_bytes.copy_from_slice(&data[NONCE_LEN..HEADER_LEN]);
        let declared = u32::from_be_bytes(len_bytes) as usize;

        let body = &data[HEADER_LEN..];
        if declared > body.len() {
            return Err(CallbackCryptoError::MalformedEnvelope {
                declared,
                available: body.len(),
            });
        }

        let (message, receive_id) = body.split_at(declared);
        Ok(Self {
            nonce,
            message: message.to_vec(),
            receive_id: receive_id.to_vec(),
        })
    }
}
