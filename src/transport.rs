use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::fmt;

use crate::models::broadcast::BroadcastContent;

#[derive(Debug)]
pub enum TransportError {
    Http(reqwest::Error),
    Api { status: u16, body: String },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Http(e) => write!(f, "HTTP error: {e}"),
            TransportError::Api { status, body } => {
                write!(f, "platform returned {status}: {body}")
            }
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        TransportError::Http(e)
    }
}

/// Outbound side of the chat platform. Every call is fallible per
/// recipient; the dispatcher treats each failure as one lost delivery,
/// never as a batch abort.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver finalized broadcast content to one recipient.
    async fn send_to(&self, chat_id: i64, content: &BroadcastContent)
        -> Result<(), TransportError>;

    /// Plain conversational reply.
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), TransportError>;

    /// Reply offering tappable choices; each choice is a `(label, action)`
    /// pair and the chosen action comes back as an update callback.
    async fn send_choices(
        &self,
        chat_id: i64,
        text: &str,
        choices: &[(&str, &str)],
    ) -> Result<(), TransportError>;
}

/// Production transport speaking the platform's Bot-API-style HTTP surface.
pub struct HttpTransport {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    async fn call(&self, method: &str, body: serde_json::Value) -> Result<(), TransportError> {
        let url = format!("{}/bot{}/{}", self.base_url, self.token, method);
        let resp = self.client.post(&url).json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Api { status, body });
        }

        Ok(())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send_to(
        &self,
        chat_id: i64,
        content: &BroadcastContent,
    ) -> Result<(), TransportError> {
        let (method, body) = match content {
            BroadcastContent::Text { text } => (
                "sendMessage",
                json!({ "chat_id": chat_id, "text": text }),
            ),
            BroadcastContent::Photo { file_id, caption } => (
                "sendPhoto",
                json!({ "chat_id": chat_id, "photo": file_id, "caption": caption }),
            ),
            BroadcastContent::Video { file_id, caption } => (
                "sendVideo",
                json!({ "chat_id": chat_id, "video": file_id, "caption": caption }),
            ),
            BroadcastContent::Document { file_id, caption } => (
                "sendDocument",
                json!({ "chat_id": chat_id, "document": file_id, "caption": caption }),
            ),
        };
        self.call(method, body).await
    }

    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        self.call("sendMessage", json!({ "chat_id": chat_id, "text": text }))
            .await
    }

    async fn send_choices(
        &self,
        chat_id: i64,
        text: &str,
        choices: &[(&str, &str)],
    ) -> Result<(), TransportError> {
        let buttons: Vec<serde_json::Value> = choices
            .iter()
            .map(|(label, action)| json!({ "text": label, "callback_data": action }))
            .collect();
        self.call(
            "sendMessage",
            json!({
                "chat_id": chat_id,
                "text": text,
                "reply_markup": { "inline_keyboard": [buttons] }
            }),
        )
        .await
    }
}
