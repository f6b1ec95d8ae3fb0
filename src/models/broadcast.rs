use serde::{Deserialize, Serialize};

/// Finalized broadcast payload, one variant per supported content kind.
/// Serialized as tagged JSON when a deferred broadcast is persisted in the
/// queue table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BroadcastContent {
    Text {
        text: String,
    },
    Photo {
        file_id: String,
        caption: Option<String>,
    },
    Video {
        file_id: String,
        caption: Option<String>,
    },
    Document {
        file_id: String,
        caption: Option<String>,
    },
}

impl BroadcastContent {
    pub fn kind(&self) -> &'static str {
        match self {
            BroadcastContent::Text { .. } => "text",
            BroadcastContent::Photo { .. } => "photo",
            BroadcastContent::Video { .. } => "video",
            BroadcastContent::Document { .. } => "document",
        }
    }
}
