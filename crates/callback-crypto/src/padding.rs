//! PKCS-style padding for the envelope cipher.
//!
//! Padding is added over the AES block size (16). On the way in, any pad value
//! in `1..=32` is accepted so that payloads padded to the platform's 32-byte
//! block also unpad cleanly.

use tracing::warn;

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// Largest pad value honoured when unpadding.
pub const MAX_PAD: u8 = 32;

/// Observer for the lenient unpadding path.
///
/// Called whenever the trailing pad byte is outside `1..=32` and the buffer is
/// returned without stripping anything.
pub trait PaddingObserver: Send + Sync {
    /// `pad_byte` is the offending trailing byte.
    fn on_padding_fallback(&self, pad_byte: u8);
}

/// Append PKCS padding so the length becomes a multiple of [`BLOCK_SIZE`].
///
/// An already aligned buffer gets a full block of padding.
pub fn pad(buf: &mut Vec<u8>) {
    let amount = BLOCK_SIZE - (buf.len() % BLOCK_SIZE);
    buf.resize(buf.len() + amount, amount as u8);
}

/// Number of bytes to strip from `buf`, per the trailing pad byte.
///
/// Returns 0 for an empty buffer or an out-of-range pad byte. The caller is
/// told about the latter through `observer`.
pub fn unpad_len(buf: &[u8], observer: Option<&dyn PaddingObserver>) -> usize {
    let Some(&last) = buf.last() else {
        return 0;
    };

    if !(1..=MAX_PAD).contains(&last) {
        warn!(
            pad_byte = last,
            len = buf.len(),
            "Pad byte out of range, leaving plaintext unpadded"
        );
        if let Some(observer) = observer {
            observer.on_padding_fallback(last);
        }
        return 0;
    }

    (last as usize).min(buf.len())
}
