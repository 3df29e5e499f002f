//! # Platform Simulator
//!
//! Produces callbacks the way the messaging platform does: signed queries,
//! encrypted echo strings and encrypted message bodies. Shared by the
//! integration flows and the benchmarks.

use aes::Aes256;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use callback_crypto::{EnvelopeCipher, SharedSecret, SignatureVerifier, Token};
use callback_gateway::GatewayConfig;
use cbc::cipher::{block_padding::NoPadding, BlockEncryptMut, KeyIvInit};

/// Token used by every fixture.
pub const TOKEN: &str = "fixture-token";

/// 43-character key decoding to 32 zero bytes under lenient decoding.
pub const ENCODING_AES_KEY: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA7";

/// Receive id stamped by the simulated platform.
pub const RECEIVE_ID: &str = "corp-fixture";

/// Fixed timestamp for deterministic queries.
pub const TIMESTAMP: &str = "1700000000";

/// Gateway configuration matching the simulator.
pub fn gateway_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.credentials.token = TOKEN.into();
    config.credentials.encoding_aes_key = ENCODING_AES_KEY.into();
    config.credentials.receive_id = Some(RECEIVE_ID.into());
    config
}

/// Percent-encode the base64 characters that are not query-safe.
pub fn query_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '+' => out.push_str("%2B"),
            '/' => out.push_str("%2F"),
            '=' => out.push_str("%3D"),
            '%' => out.push_str("%25"),
            '&' => out.push_str("%26"),
            ' ' => out.push_str("%20"),
            _ => out.push(c),
        }
    }
    out
}

/// The platform side of the protocol.
pub struct PlatformSimulator {
    secret: SharedSecret,
    verifier: SignatureVerifier,
    cipher: EnvelopeCipher,
    receive_id: String,
}

impl Default for PlatformSimulator {
    fn default() -> Self {
        Self::new(TOKEN, ENCODING_AES_KEY, RECEIVE_ID)
    }
}

impl PlatformSimulator {
    /// Simulator sharing `token` and `encoding_aes_key` with the gateway.
    ///
    /// # Panics
    ///
    /// If the key is not a valid 43-character key.
    pub fn new(token: &str, encoding_aes_key: &str, receive_id: &str) -> Self {
        let secret = SharedSecret::from_encoding_aes_key(encoding_aes_key)
            .expect("fixture key must be valid");
        Self {
            cipher: EnvelopeCipher::new(secret.clone()),
            secret,
            verifier: SignatureVerifier::new(Token::new(token)),
            receive_id: receive_id.to_string(),
        }
    }

    /// Verifier holding the shared token.
    pub fn verifier(&self) -> &SignatureVerifier {
        &self.verifier
    }

    /// Cipher holding the shared secret.
    pub fn cipher(&self) -> &EnvelopeCipher {
        &self.cipher
    }

    /// Encrypt as the platform would.
    pub fn encrypt(&self, message: &str) -> String {
        self.cipher
            .encrypt(message.as_bytes(), &self.receive_id)
            .expect("fixture encryption")
    }

    /// Plain-mode handshake URI for `path`.
    pub fn plain_handshake_uri(&self, path: &str, nonce: &str, echostr: &str) -> String {
        let signature = self.verifier.sign(TIMESTAMP, nonce, None);
        format!(
            "{path}?signature={signature}&timestamp={TIMESTAMP}&nonce={nonce}&echostr={}",
            query_escape(echostr)
        )
    }

    /// Encrypted-mode handshake URI carrying `plain_echo` encrypted.
    pub fn encrypted_handshake_uri(&self, path: &str, nonce: &str, plain_echo: &str) -> String {
        self.encrypted_handshake_uri_raw(path, nonce, &self.encrypt(plain_echo))
    }

    /// Encrypted-mode handshake URI carrying an arbitrary, correctly signed
    /// `echostr`.
    pub fn encrypted_handshake_uri_raw(&self, path: &str, nonce: &str, echostr: &str) -> String {
        let signature = self.verifier.sign(TIMESTAMP, nonce, Some(echostr));
        format!(
            "{path}?msg_signature={signature}&timestamp={TIMESTAMP}&nonce={nonce}&echostr={}",
            query_escape(echostr)
        )
    }

    /// Encrypted message push: URI and outer XML body.
    pub fn message_push(&self, path: &str, nonce: &str, inner_xml: &str) -> (String, String) {
        let encrypt = self.encrypt(inner_xml);
        let signature = self.verifier.sign(TIMESTAMP, nonce, Some(&encrypt));
        let uri = format!("{path}?msg_signature={signature}&timestamp={TIMESTAMP}&nonce={nonce}");
        let body = format!(
            "<xml><ToUserName><![CDATA[{}]]></ToUserName>\
             <Encrypt><![CDATA[{encrypt}]]></Encrypt>\
             <AgentID><![CDATA[1000002]]></AgentID></xml>",
            self.receive_id
        );
        (uri, body)
    }

    /// Encrypt `plaintext` verbatim: no framing, no padding. The length must
    /// be a multiple of 16.
    pub fn encrypt_raw(&self, plaintext: &[u8]) -> String {
        let mut buf = plaintext.to_vec();
        let len = buf.len();
        let key = self.secret.as_bytes();
        let iv = self.secret.iv();
        cbc::Encryptor::<Aes256>::new(key.into(), &iv.into())
            .encrypt_padded_mut::<NoPadding>(&mut buf, len)
            .expect("plaintext must be block aligned");
        STANDARD.encode(buf)
    }

    /// Frame `message` and pad to a 32-byte boundary, as some platform
    /// libraries do, then encrypt.
    pub fn encrypt_padded_32(&self, message: &str) -> String {
        let mut plain = vec![0x5a; 16];
        plain.extend_from_slice(&(message.len() as u32).to_be_bytes());
        plain.extend_from_slice(message.as_bytes());
        plain.extend_from_slice(self.receive_id.as_bytes());
        let pad = 32 - (plain.len() % 32);
        plain.resize(plain.len() + pad, pad as u8);
        self.encrypt_raw(&plain)
    }
}

/// Inner XML of a text message.
pub fn text_message(from: &str, content: &str) -> String {
    format!(
        "<xml><ToUserName><![CDATA[{RECEIVE_ID}]]></ToUserName>\
         <FromUserName><![CDATA[{from}]]></FromUserName>\
         <CreateTime>{TIMESTAMP}</CreateTime>\
         <MsgType><![CDATA[text]]></MsgType>\
         <Content><![CDATA[{content}]]></Content>\
         <MsgId>7300000000000000001</MsgId>\
         <AgentID>1000002</AgentID></xml>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use callback_gateway::{CallbackGatewayService, EncryptedQuery};
    use proptest::prelude::*;

    #[test]
    fn test_query_escape() {
        assert_eq!(query_escape("a+b/c=="), "a%2Bb%2Fc%3D%3D");
        assert_eq!(query_escape("plain"), "plain");
    }

    #[test]
    fn test_padded_32_is_accepted() {
        let sim = PlatformSimulator::default();
        let sealed = sim.encrypt_padded_32("echo");
        assert_eq!(sim.cipher().decrypt(&sealed).unwrap(), b"echo");
    }

    #[test]
    fn test_config_validates() {
        assert!(gateway_config().validate().is_ok());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_any_echo_survives_handshake(echo in "\\PC{0,200}", nonce in "[a-z0-9]{1,16}") {
            let sim = PlatformSimulator::default();
            let controller = CallbackGatewayService::new(gateway_config()).unwrap().controller();

            let echostr = sim.encrypt(&echo);
            let query = EncryptedQuery {
                msg_signature: Some(sim.verifier().sign(TIMESTAMP, &nonce, Some(&echostr))),
                timestamp: Some(TIMESTAMP.to_string()),
                nonce: Some(nonce),
                echostr: Some(echostr),
            };
            prop_assert_eq!(controller.verify_encrypted(&query).unwrap(), echo);
        }
    }
}
