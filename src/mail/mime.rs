use serde::Deserialize;

use crate::mail::decoders::decode_base64_text;

pub const NO_TEXT_BODY: &str = "(no text body)";

/// A node of the Gmail `payload` tree.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MimePart {
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub body: Option<PartBody>,
    #[serde(default)]
    pub parts: Option<Vec<MimePart>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PartBody {
    /// URL-safe base64
    #[serde(default)]
    pub data: Option<String>,
}

impl MimePart {
    fn data(&self) -> Option<&str> {
        self.body
            .as_ref()
            .and_then(|b| b.data.as_deref())
            .filter(|d| !d.is_empty())
    }
}

/// Locate the plain-text body of a message.
///
/// A leaf returns its own decoded data. Otherwise the first `text/plain`
/// child carrying data wins, and the first `multipart/*` child reached is
/// descended into and its result returned as-is.
pub fn extract_plain_text_body(part: &MimePart) -> String {
    let Some(parts) = &part.parts else {
        return part.data().map(decode_or_placeholder).unwrap_or_else(placeholder);
    };

    for sub in parts {
        if sub.mime_type == "text/plain" {
            if let Some(data) = sub.data() {
                return decode_or_placeholder(data);
            }
        } else if sub.mime_type.starts_with("multipart/") {
            return extract_plain_text_body(sub);
        }
    }
    placeholder()
}

fn decode_or_placeholder(data: &str) -> String {
    decode_base64_text(data).unwrap_or_else(|| {
        log::warn!("message body is not valid base64; using placeholder");
        placeholder()
    })
}

fn placeholder() -> String {
    NO_TEXT_BODY.to_string()
}
