//! Callback counters, exported as JSON on `/metrics`.

use crate::domain::error::HandshakeError;
use callback_crypto::PaddingObserver;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Callback gateway metrics
#[derive(Debug, Default)]
pub struct CallbackMetrics {
    // Request counters
    pub requests_total: AtomicU64,
    pub requests_success: AtomicU64,
    pub requests_error: AtomicU64,

    // Flow outcomes
    pub plain_handshakes: AtomicU64,
    pub encrypted_handshakes: AtomicU64,
    pub messages_received: AtomicU64,
    pub replies_sent: AtomicU64,

    // Flow failures
    pub signature_failures: AtomicU64,
    pub base64_failures: AtomicU64,
    pub decryption_failures: AtomicU64,
    pub invalid_messages: AtomicU64,
    pub unexpected_failures: AtomicU64,

    // Lenient unpadding taken
    pub padding_fallbacks: AtomicU64,

    // Latency tracking
    pub total_latency_ms: AtomicU64,
    pub request_count_for_latency: AtomicU64,
}

impl CallbackMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished HTTP request
    pub fn record_request(&self, success: bool, latency_ms: u64) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);

        if success {
            self.requests_success.fetch_add(1, Ordering::Relaxed);
        } else {
            self.requests_error.fetch_add(1, Ordering::Relaxed);
        }

        self.total_latency_ms
            .fetch_add(latency_ms, Ordering::Relaxed);
        self.request_count_for_latency
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful plain-mode handshake
    pub fn record_plain_handshake(&self) {
        self.plain_handshakes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful encrypted-mode handshake
    pub fn record_encrypted_handshake(&self) {
        self.encrypted_handshakes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an accepted inbound message
    pub fn record_message(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a passive reply
    pub fn record_reply(&self) {
        self.replies_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a signature mismatch outside the error path (plain mode).
    pub fn record_signature_failure(&self) {
        self.signature_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed callback by error kind
    pub fn record_failure(&self, error: &HandshakeError) {
        let counter = match error {
            HandshakeError::SignatureMismatch => &self.signature_failures,
            HandshakeError::InvalidBase64 => &self.base64_failures,
            HandshakeError::DecryptionFailed { .. } => &self.decryption_failures,
            HandshakeError::InvalidMessage { .. } => &self.invalid_messages,
            HandshakeError::Unexpected(_) => &self.unexpected_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get average latency in ms
    pub fn average_latency_ms(&self) -> f64 {
        let total = self.total_latency_ms.load(Ordering::Relaxed);
        let count = self.request_count_for_latency.load(Ordering::Relaxed);
        if count == 0 {
            0.0
        } else {
            total as f64 / count as f64
        }
    }

    /// Export metrics as JSON
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "requests": {
                "total": self.requests_total.load(Ordering::Relaxed),
                "success": self.requests_success.load(Ordering::Relaxed),
                "error": self.requests_error.load(Ordering::Relaxed),
            },
            "callbacks": {
                "plain_handshakes": self.plain_handshakes.load(Ordering::Relaxed),
                "encrypted_handshakes": self.encrypted_handshakes.load(Ordering::Relaxed),
                "messages_received": self.messages_received.load(Ordering::Relaxed),
                "replies_sent": self.replies_sent.load(Ordering::Relaxed),
            },
            "failures": {
                "signature": self.signature_failures.load(Ordering::Relaxed),
                "base64": self.base64_failures.load(Ordering::Relaxed),
                "decryption": self.decryption_failures.load(Ordering::Relaxed),
                "invalid_message": self.invalid_messages.load(Ordering::Relaxed),
                "unexpected": self.unexpected_failures.load(Ordering::Relaxed),
            },
            "padding_fallbacks": self.padding_fallbacks.load(Ordering::Relaxed),
            "latency": {
                "average_ms": self.average_latency_ms(),
            }
        })
    }
}

impl PaddingObserver for CallbackMetrics {
    fn on_padding_fallback(&self, _pad_byte: u8) {
        self.padding_fallbacks.fetch_add(1, Ordering::Relaxed);
    }
}

/// Request timing helper
pub struct RequestTimer {
    start: Instant,
}

impl RequestTimer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn finish(self, metrics: &CallbackMetrics, success: bool) {
        let latency_ms = self.start.elapsed().as_millis() as u64;
        metrics.record_request(success, latency_ms);
    }
}
