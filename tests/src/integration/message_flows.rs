//! # Message Flows
//!
//! Message pushes after the callback URL is verified:
//!
//! 1. **Plain push**: unsigned XML, passive text reply or `success`
//! 2. **Encrypted push**: signed envelope, decrypted and acknowledged
//! 3. **Sealed reply**: gateway-encrypted reply opened by the platform side

#[cfg(test)]
mod tests {
    use super::super::post;
    use crate::fixtures::{gateway_config, text_message, PlatformSimulator, RECEIVE_ID, TIMESTAMP};
    use axum::http::StatusCode;
    use axum::Router;
    use callback_gateway::{CallbackGatewayService, InboundMessage, SealedReply};
    use std::sync::atomic::Ordering;

    fn service() -> CallbackGatewayService {
        CallbackGatewayService::new(gateway_config()).expect("fixture config is valid")
    }

    fn app() -> Router {
        service().router()
    }

    // =========================================================================
    // PLAIN PUSH
    // =========================================================================

    #[tokio::test]
    async fn test_plain_text_gets_reply() {
        let (status, body) = post(app(), "/wx", text_message("openid-1", "ping")).await;
        assert_eq!(status, StatusCode::OK);

        let reply = InboundMessage::from_xml(&body).unwrap();
        assert_eq!(reply.to_user_name.as_deref(), Some("openid-1"));
        assert_eq!(reply.from_user_name.as_deref(), Some(RECEIVE_ID));
        assert_eq!(reply.msg_type.as_deref(), Some("text"));
        assert!(reply.content.unwrap().ends_with("ping"));
    }

    #[tokio::test]
    async fn test_plain_event_is_acknowledged() {
        let body = "<xml><ToUserName>svc</ToUserName><FromUserName>u</FromUserName>\
                    <MsgType>event</MsgType><Event>subscribe</Event></xml>";
        assert_eq!(
            post(app(), "/wx", body.to_string()).await,
            (StatusCode::OK, "success".to_string())
        );
    }

    // =========================================================================
    // ENCRYPTED PUSH
    // =========================================================================

    #[tokio::test]
    async fn test_encrypted_push_acknowledged() {
        let service = service();
        let sim = PlatformSimulator::default();
        let (uri, body) = sim.message_push("/work", "push-1", &text_message("zhangsan", "hi"));

        assert_eq!(
            post(service.router(), &uri, body).await,
            (StatusCode::OK, "success".to_string())
        );
        assert_eq!(
            service.metrics().messages_received.load(Ordering::Relaxed),
            1
        );
    }

    #[tokio::test]
    async fn test_encrypted_push_replayed_with_other_nonce() {
        let sim = PlatformSimulator::default();
        let (uri, body) = sim.message_push("/work", "push-1", &text_message("u", "hi"));
        let replay = uri.replace("nonce=push-1", "nonce=push-2");

        assert_eq!(
            post(app(), &replay, body).await,
            (
                StatusCode::FORBIDDEN,
                "Signature verification failed".to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_encrypted_push_bad_inner_xml() {
        let sim = PlatformSimulator::default();
        let (uri, body) = sim.message_push("/work", "n", "<xml><MsgType>text</Msg");
        assert_eq!(
            post(app(), &uri, body).await,
            (StatusCode::BAD_REQUEST, "Invalid message format".to_string())
        );
    }

    #[tokio::test]
    async fn test_encrypted_push_undecryptable() {
        let sim = PlatformSimulator::default();
        // Correctly signed, 15 bytes of ciphertext
        let encrypt = "AAAAAAAAAAAAAAAAAAAA";
        let signature = sim.verifier().sign(TIMESTAMP, "n", Some(encrypt));
        let uri = format!("/work?msg_signature={signature}&timestamp={TIMESTAMP}&nonce=n");
        let body = format!("<xml><Encrypt><![CDATA[{encrypt}]]></Encrypt></xml>");
        assert_eq!(
            post(app(), &uri, body).await,
            (StatusCode::BAD_REQUEST, "Decryption failed".to_string())
        );
    }

    // =========================================================================
    // SEALED REPLY
    // =========================================================================

    #[test]
    fn test_sealed_reply_opened_by_platform() {
        let service = service();
        let controller = service.controller();
        let sim = PlatformSimulator::default();

        let reply_xml = "<xml><MsgType><![CDATA[text]]></MsgType>\
                         <Content><![CDATA[pong]]></Content></xml>";
        let sealed = controller.seal_reply(reply_xml, "1700000123", "r1").unwrap();

        let parsed = SealedReply::from_xml(&sealed.to_xml()).unwrap();
        assert_eq!(parsed, sealed);
        assert!(sim.verifier().verify(
            &parsed.msg_signature,
            &parsed.timestamp,
            &parsed.nonce,
            Some(&parsed.encrypt)
        ));

        let envelope = sim.cipher().open(&parsed.encrypt).unwrap();
        assert_eq!(envelope.message, reply_xml.as_bytes());
        assert_eq!(envelope.receive_id, RECEIVE_ID.as_bytes());
    }
}
