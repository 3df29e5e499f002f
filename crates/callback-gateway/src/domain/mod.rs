//! Domain types for the callback gateway.
//!
//! Configuration, error mapping, query parameters and message documents.

pub mod config;
pub mod error;
pub mod message;
pub mod types;

// Re-exports for convenience
pub use config::{ConfigError, CredentialsConfig, GatewayConfig, LimitsConfig, RoutesConfig};
pub use error::{GatewayError, HandshakeError, HandshakeResult};
pub use message::{EncryptedBody, InboundMessage, SealedReply};
pub use types::{EncryptedQuery, PlainQuery};
