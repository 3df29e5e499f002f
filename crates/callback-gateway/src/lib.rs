// Allow missing docs for internal items
#![allow(missing_docs)]

//! Callback Gateway - HTTP surface for platform webhook callbacks.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      CALLBACK GATEWAY                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │   GET/POST /wx (plain)          GET/POST /work (encrypted)    │
//! │          │                               │                    │
//! │  ┌───────┴───────────────────────────────┴───────┐            │
//! │  │   Middleware: Tracing → Timeout → Body limit   │            │
//! │  └───────────────────────┬────────────────────────┘            │
//! │                          │                                    │
//! │  ┌───────────────────────┴────────────────────────┐            │
//! │  │        CallbackHandshakeController             │            │
//! │  │  SignatureVerifier  +  EnvelopeCipher          │            │
//! │  └────────────────────────────────────────────────┘            │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Responses
//!
//! | Route | Outcome | Status | Body |
//! |-------|---------|--------|------|
//! | GET plain | empty query string | 200 | greeting |
//! | GET plain | match | 200 | `echostr` |
//! | GET plain | mismatch or no `signature` | 200 | empty |
//! | GET plain | no `timestamp`/`nonce` | 200 | error text |
//! | GET encrypted | match | 200 | decrypted `echostr` |
//! | GET encrypted | mismatch | 403 | `Signature verification failed` |
//! | GET encrypted | not base64 | 400 | `Invalid base64 echostr` |
//! | GET encrypted | cannot decrypt | 400 | `Decryption failed` |
//! | POST plain | text/voice | 200 | XML reply |
//! | POST plain | anything else | 200 | `success` |
//! | POST encrypted | accepted | 200 | `success` |
//!
//! # Usage
//!
//! ```ignore
//! use callback_gateway::{CallbackGatewayService, GatewayConfig};
//!
//! let config = GatewayConfig::load("callback.toml")?;
//! let mut service = CallbackGatewayService::new(config)?;
//! service.start().await?;
//! service.wait().await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod controller;
pub mod domain;
pub mod middleware;
pub mod service;

// Re-exports for public API
pub use controller::{CallbackHandshakeController, PlainReply, ACK_BODY, GREETING_BODY};
pub use domain::config::{ConfigError, GatewayConfig};
pub use domain::error::{GatewayError, HandshakeError, HandshakeResult};
pub use domain::message::{EncryptedBody, InboundMessage, SealedReply};
pub use domain::types::{EncryptedQuery, PlainQuery};
pub use middleware::CallbackMetrics;
pub use service::{build_router, CallbackGatewayService};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
