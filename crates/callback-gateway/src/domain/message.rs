//! Callback message documents.
//!
//! The platform POSTs XML. Inbound documents are read with `quick-xml`'s serde
//! support; replies are rendered by hand because every text node is wrapped in
//! CDATA.

use serde::Deserialize;
use std::fmt::Write;

/// Reply prefix for echoed text messages.
pub const TEXT_REPLY_PREFIX: &str = "你发送的消息是: ";
/// Reply prefix for recognized voice messages.
pub const VOICE_REPLY_PREFIX: &str = "收到你的语音消息，识别结果是: ";
/// Reply for voice messages without a recognition result.
pub const VOICE_UNRECOGNIZED_REPLY: &str =
    "收到你的语音消息。由于未开启语音识别功能，无法显示语音内容。";

/// User message or event pushed by the platform.
///
/// Every field is optional; which ones are present depends on `MsgType`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename = "xml", default)]
pub struct InboundMessage {
    #[serde(rename = "ToUserName")]
    pub to_user_name: Option<String>,
    #[serde(rename = "FromUserName")]
    pub from_user_name: Option<String>,
    #[serde(rename = "CreateTime")]
    pub create_time: Option<String>,
    #[serde(rename = "MsgType")]
    pub msg_type: Option<String>,
    #[serde(rename = "Content")]
    pub content: Option<String>,
    #[serde(rename = "MsgId")]
    pub msg_id: Option<String>,
    #[serde(rename = "MediaId")]
    pub media_id: Option<String>,
    #[serde(rename = "Format")]
    pub format: Option<String>,
    #[serde(rename = "Recognition")]
    pub recognition: Option<String>,
    #[serde(rename = "PicUrl")]
    pub pic_url: Option<String>,
    #[serde(rename = "ThumbMediaId")]
    pub thumb_media_id: Option<String>,
    #[serde(rename = "Location_X")]
    pub location_x: Option<String>,
    #[serde(rename = "Location_Y")]
    pub location_y: Option<String>,
    #[serde(rename = "Scale")]
    pub scale: Option<String>,
    #[serde(rename = "Label")]
    pub label: Option<String>,
    #[serde(rename = "Title")]
    pub title: Option<String>,
    #[serde(rename = "Description")]
    pub description: Option<String>,
    #[serde(rename = "Url")]
    pub url: Option<String>,
    #[serde(rename = "Event")]
    pub event: Option<String>,
    #[serde(rename = "EventKey")]
    pub event_key: Option<String>,
    #[serde(rename = "Token")]
    pub token: Option<String>,
    #[serde(rename = "OpenKfId")]
    pub open_kf_id: Option<String>,
    #[serde(rename = "AgentID")]
    pub agent_id: Option<String>,
}

impl InboundMessage {
    /// Parse an `<xml>...</xml>` document.
    pub fn from_xml(xml: &str) -> Result<Self, quick_xml::DeError> {
        quick_xml::de::from_str(xml)
    }

    /// One-line description for logs. Never includes `Content`.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "type={} from={} to={} time={}",
            field(&self.msg_type),
            field(&self.from_user_name),
            field(&self.to_user_name),
            field(&self.create_time),
        );

        // Writing to a String cannot fail
        let _ = match self.msg_type.as_deref() {
            Some("text") => write!(out, " msg_id={}", field(&self.msg_id)),
            Some("image") => write!(
                out,
                " media_id={} pic_url={}",
                field(&self.media_id),
                field(&self.pic_url)
            ),
            Some("voice") => write!(
                out,
                " media_id={} format={} recognized={}",
                field(&self.media_id),
                field(&self.format),
                self.recognition.is_some()
            ),
            Some("video") => write!(
                out,
                " media_id={} thumb_media_id={}",
                field(&self.media_id),
                field(&self.thumb_media_id)
            ),
            Some("location") => write!(
                out,
                " lat={} lon={} scale={} label={}",
                field(&self.location_x),
                field(&self.location_y),
                field(&self.scale),
                field(&self.label)
            ),
            Some("link") => write!(
                out,
                " title={} url={}",
                field(&self.title),
                field(&self.url)
            ),
            Some("event") => match self.event.as_deref() {
                Some("kf_msg_or_event") => write!(
                    out,
                    " event=kf_msg_or_event open_kf_id={}",
                    field(&self.open_kf_id)
                ),
                Some("click") => write!(
                    out,
                    " event=click key={}",
                    field(&self.event_key)
                ),
                _ => write!(out, " event={}", field(&self.event)),
            },
            _ => Ok(()),
        };
        out
    }
}

fn field(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

/// Outer document of an encrypted POST.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename = "xml")]
pub struct EncryptedBody {
    #[serde(rename = "ToUserName", default)]
    pub to_user_name: Option<String>,
    #[serde(rename = "Encrypt")]
    pub encrypt: String,
    #[serde(rename = "AgentID", default)]
    pub agent_id: Option<String>,
}

impl EncryptedBody {
    /// Parse an `<xml>...</xml>` document. `Encrypt` is required.
    pub fn from_xml(xml: &str) -> Result<Self, quick_xml::DeError> {
        quick_xml::de::from_str(xml)
    }
}

/// Encrypted and signed passive reply.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename = "xml")]
pub struct SealedReply {
    #[serde(rename = "Encrypt")]
    pub encrypt: String,
    #[serde(rename = "MsgSignature")]
    pub msg_signature: String,
    #[serde(rename = "TimeStamp")]
    pub timestamp: String,
    #[serde(rename = "Nonce")]
    pub nonce: String,
}

impl SealedReply {
    /// Parse a rendered reply.
    pub fn from_xml(xml: &str) -> Result<Self, quick_xml::DeError> {
        quick_xml::de::from_str(xml)
    }

    /// Render as the platform expects it.
    pub fn to_xml(&self) -> String {
        format!(
            "<xml><Encrypt>{}</Encrypt><MsgSignature>{}</MsgSignature>\
             <TimeStamp>{}</TimeStamp><Nonce>{}</Nonce></xml>",
            cdata(&self.encrypt),
            cdata(&self.msg_signature),
            cdata(&self.timestamp),
            cdata(&self.nonce),
        )
    }
}

/// Render a text passive reply. `to`/`from` are from the reply's perspective.
pub fn render_text_reply(to: &str, from: &str, create_time: i64, content: &str) -> String {
    format!(
        "<xml><ToUserName>{}</ToUserName><FromUserName>{}</FromUserName>\
         <CreateTime>{}</CreateTime><MsgType><![CDATA[text]]></MsgType>\
         <Content>{}</Content></xml>",
        cdata(to),
        cdata(from),
        create_time,
        cdata(content),
    )
}

/// Wrap `text` in a CDATA section, splitting any embedded terminator.
pub fn cdata(text: &str) -> String {
    format!("<![CDATA[{}]]>", text.replace("]]>", "]]]]><![CDATA[>"))
}
