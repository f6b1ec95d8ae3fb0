use serde::Deserialize;

use crate::models::broadcast::BroadcastContent;

/// One decoded inbound update, as delivered by the ingress layer.
/// Either `message` or `callback` is set; an update carrying neither is
/// ignored by the handler.
#[derive(Debug, Deserialize)]
pub struct Update {
    pub sender_id: i64,
    pub display_name: String,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
    #[serde(default)]
    pub callback: Option<String>,
}

/// Message content as decoded off the wire. Content kinds the broadcast
/// flow does not support (stickers, voice notes, ...) collapse into
/// `Unsupported` so the session can re-prompt without storing anything.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IncomingMessage {
    Text {
        text: String,
    },
    Photo {
        file_id: String,
        #[serde(default)]
        caption: Option<String>,
    },
    Video {
        file_id: String,
        #[serde(default)]
        caption: Option<String>,
    },
    Document {
        file_id: String,
        #[serde(default)]
        caption: Option<String>,
    },
    #[serde(other)]
    Unsupported,
}

impl IncomingMessage {
    /// Convert to a broadcastable payload, or `None` for unsupported kinds.
    pub fn into_content(self) -> Option<BroadcastContent> {
        match self {
            IncomingMessage::Text { text } => Some(BroadcastContent::Text { text }),
            IncomingMessage::Photo { file_id, caption } => {
                Some(BroadcastContent::Photo { file_id, caption })
            }
            IncomingMessage::Video { file_id, caption } => {
                Some(BroadcastContent::Video { file_id, caption })
            }
            IncomingMessage::Document { file_id, caption } => {
                Some(BroadcastContent::Document { file_id, caption })
            }
            IncomingMessage::Unsupported => None,
        }
    }

    /// The plain text of a text message, if this is one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            IncomingMessage::Text { text } => Some(text),
            _ => None,
        }
    }
}
