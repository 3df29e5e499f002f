//! Gateway configuration with validation.
//!
//! Sources are layered: defaults, then an optional TOML file, then `CB_*`
//! environment variables. Each layer overrides the fields it sets.

use callback_crypto::SharedSecret;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

/// Environment variable carrying the shared token.
pub const ENV_TOKEN: &str = "CB_TOKEN";
/// Environment variable carrying the 43-character encoding key.
pub const ENV_ENCODING_AES_KEY: &str = "CB_ENCODING_AES_KEY";
/// Environment variable carrying the expected receive id.
pub const ENV_RECEIVE_ID: &str = "CB_RECEIVE_ID";
/// Environment variable enabling the receive id check.
pub const ENV_VERIFY_RECEIVE_ID: &str = "CB_VERIFY_RECEIVE_ID";
/// Environment variable overriding the HTTP port.
pub const ENV_HTTP_PORT: &str = "CB_HTTP_PORT";

/// Main gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP server configuration
    pub http: HttpConfig,
    /// Callback paths
    pub routes: RoutesConfig,
    /// Shared credentials
    pub credentials: CredentialsConfig,
    /// Request limits
    pub limits: LimitsConfig,
}

impl GatewayConfig {
    /// Parse configuration from TOML text. Missing sections take defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Apply `CB_*` overrides through `lookup`.
    ///
    /// `lookup` is normally `|key| std::env::var(key).ok()`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(ENV_TOKEN) {
            self.credentials.token = token;
        }
        if let Some(key) = lookup(ENV_ENCODING_AES_KEY) {
            self.credentials.encoding_aes_key = key;
        }
        if let Some(id) = lookup(ENV_RECEIVE_ID) {
            self.credentials.receive_id = Some(id).filter(|id| !id.is_empty());
        }
        if let Some(flag) = lookup(ENV_VERIFY_RECEIVE_ID) {
            self.credentials.verify_receive_id = parse_flag(&flag).ok_or_else(|| {
                ConfigError::Invalid(format!("{ENV_VERIFY_RECEIVE_ID}={flag} is not a boolean"))
            })?;
        }
        if let Some(port) = lookup(ENV_HTTP_PORT) {
            self.http.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("{ENV_HTTP_PORT}={port} is not a port")))?;
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.credentials.token.is_empty() {
            return Err(ConfigError::MissingToken);
        }

        // The key must decode to exactly 32 bytes
        self.credentials.shared_secret()?;

        if self.credentials.verify_receive_id && self.credentials.receive_id.is_none() {
            return Err(ConfigError::MissingReceiveId);
        }

        for path in [&self.routes.plain_path, &self.routes.encrypted_path] {
            if !path.starts_with('/') || path.len() < 2 {
                return Err(ConfigError::InvalidPath(path.clone()));
            }
        }
        if self.routes.plain_path == self.routes.encrypted_path {
            return Err(ConfigError::DuplicatePaths);
        }

        if self.limits.max_body_size == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_body_size cannot be 0".into(),
            ));
        }
        if self.limits.request_timeout.is_zero() {
            return Err(ConfigError::InvalidLimit(
                "request_timeout cannot be 0".into(),
            ));
        }

        Ok(())
    }

    /// Get HTTP server bind address
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address
    pub host: IpAddr,
    /// Port (default: 8080)
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 8080,
        }
    }
}

/// Callback paths
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutesConfig {
    /// Plain-mode (official account) callback path
    pub plain_path: String,
    /// Encrypted-mode (enterprise) callback path
    pub encrypted_path: String,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            plain_path: "/wx".into(),
            encrypted_path: "/work".into(),
        }
    }
}

/// Shared credentials issued by the platform.
///
/// Secrets are never serialized and are redacted from `Debug`.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// Shared signing token
    #[serde(skip_serializing)]
    pub token: String,
    /// 43-character base64 key
    #[serde(skip_serializing)]
    pub encoding_aes_key: String,
    /// Receive id stamped into outbound envelopes and checked on inbound ones
    pub receive_id: Option<String>,
    /// Reject envelopes whose receive id differs from `receive_id`
    pub verify_receive_id: bool,
}

impl CredentialsConfig {
    /// Decode the encoding key.
    pub fn shared_secret(&self) -> Result<SharedSecret, ConfigError> {
        SharedSecret::from_encoding_aes_key(&self.encoding_aes_key)
            .map_err(|e| ConfigError::InvalidKey(e.to_string()))
    }
}

impl fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("token", &"<redacted>")
            .field("encoding_aes_key", &"<redacted>")
            .field("receive_id", &self.receive_id)
            .field("verify_receive_id", &self.verify_receive_id)
            .finish()
    }
}

/// Request limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes
    pub max_body_size: usize,
    /// Per-request timeout
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 64 * 1024,
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config: {0}")]
    Io(String),
    /// Config file is not valid TOML for this schema
    #[error("failed to parse config: {0}")]
    Parse(String),
    /// No token configured
    #[error("token must be configured")]
    MissingToken,
    /// Encoding key does not decode to a 256-bit key
    #[error("invalid encoding_aes_key: {0}")]
    InvalidKey(String),
    /// Receive id check requested without a receive id
    #[error("verify_receive_id requires receive_id")]
    MissingReceiveId,
    /// Route path is not absolute
    #[error("invalid route path: {0:?}")]
    InvalidPath(String),
    /// Both modes on the same path
    #[error("plain and encrypted paths must differ")]
    DuplicatePaths,
    /// Invalid size or timeout limit
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
    /// General configuration error
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Humantime serde module for Duration serialization
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() == 0 {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        } else {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse_duration(s: &str) -> Result<Duration, &'static str> {
        let s = s.trim();
        if let Some(ms) = s.strip_suffix("ms") {
            ms.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| "invalid milliseconds")
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid seconds")
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.trim()
                .parse::<u64>()
                .map(|m| Duration::from_secs(m * 60))
                .map_err(|_| "invalid minutes")
        } else {
            // Plain seconds
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid duration format")
        }
    }
}
