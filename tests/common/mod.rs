#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use http::{Method, Request, StatusCode};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use heraldbot::db;
use heraldbot::models::broadcast::BroadcastContent;
use heraldbot::session::SessionStore;
use heraldbot::state::AppState;
use heraldbot::transport::{Transport, TransportError};

/// Default authorized operator for tests.
pub const OPERATOR_ID: i64 = 900;

/// Transport fake that records every outbound call and can be told to fail
/// deliveries to specific recipients.
#[derive(Default)]
pub struct RecordingTransport {
    pub deliveries: Mutex<Vec<(i64, BroadcastContent)>>,
    pub texts: Mutex<Vec<(i64, String)>>,
    pub choices: Mutex<Vec<(i64, Vec<String>)>>,
    pub failing: Mutex<HashSet<i64>>,
}

impl RecordingTransport {
    pub fn fail_for(&self, chat_id: i64) {
        self.failing.lock().unwrap().insert(chat_id);
    }

    /// All text replies sent to one chat, in order.
    pub fn texts_to(&self, chat_id: i64) -> Vec<String> {
        self.texts
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == chat_id)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn last_text_to(&self, chat_id: i64) -> Option<String> {
        self.texts_to(chat_id).pop()
    }

    pub fn deliveries_to(&self, chat_id: i64) -> Vec<BroadcastContent> {
        self.deliveries
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == chat_id)
            .map(|(_, content)| content.clone())
            .collect()
    }

    pub fn delivery_count(&self) -> usize {
        self.deliveries.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_to(
        &self,
        chat_id: i64,
        content: &BroadcastContent,
    ) -> Result<(), TransportError> {
        if self.failing.lock().unwrap().contains(&chat_id) {
            return Err(TransportError::Api {
                status: 403,
                body: "blocked by recipient".to_string(),
            });
        }
        self.deliveries
            .lock()
            .unwrap()
            .push((chat_id, content.clone()));
        Ok(())
    }

    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        self.texts.lock().unwrap().push((chat_id, text.to_string()));
        Ok(())
    }

    async fn send_choices(
        &self,
        chat_id: i64,
        text: &str,
        choices: &[(&str, &str)],
    ) -> Result<(), TransportError> {
        self.texts.lock().unwrap().push((chat_id, text.to_string()));
        self.choices.lock().unwrap().push((
            chat_id,
            choices.iter().map(|(_, action)| action.to_string()).collect(),
        ));
        Ok(())
    }
}

/// Test server owning an in-memory SQLite pool, a recording transport, and
/// full AppState. Each instance is isolated — safe for parallel tests.
pub struct TestServer {
    pub state: AppState,
    pub transport: Arc<RecordingTransport>,
}

impl TestServer {
    pub async fn new() -> Self {
        Self::with_operators(&[OPERATOR_ID]).await
    }

    pub async fn with_operators(operators: &[i64]) -> Self {
        // A uniquely named shared-cache memory database, so every pooled
        // connection sees the same data and parallel tests stay isolated.
        static TEST_DB_SEQ: AtomicU64 = AtomicU64::new(0);
        let n = TEST_DB_SEQ.fetch_add(1, Ordering::Relaxed);
        let url = format!("sqlite:file:heraldbot-test-{n}?mode=memory&cache=shared");

        let pool = db::create_pool(&url)
            .await
            .expect("failed to create test pool");

        let transport = Arc::new(RecordingTransport::default());

        let state = AppState {
            db: pool,
            sessions: SessionStore::new(),
            transport: transport.clone(),
            operators: Arc::new(operators.iter().copied().collect()),
        };

        Self { state, transport }
    }

    pub fn router(&self) -> axum::Router {
        heraldbot::routes::router(self.state.clone())
    }

    /// POST one decoded update to /webhook and return the response status.
    pub async fn post_update(&self, update: serde_json::Value) -> StatusCode {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/webhook")
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_vec(&update).unwrap()))
            .unwrap();
        self.router().oneshot(request).await.unwrap().status()
    }

    pub async fn send_text(&self, sender_id: i64, name: &str, text: &str) -> StatusCode {
        self.post_update(text_update(sender_id, name, text)).await
    }

    pub async fn send_callback(&self, sender_id: i64, action: &str) -> StatusCode {
        self.post_update(callback_update(sender_id, action)).await
    }

    /// Register `count` plain users via /start, with chat ids 1..=count.
    pub async fn register_users(&self, count: i64) {
        for chat_id in 1..=count {
            let status = self
                .send_text(chat_id, &format!("user{chat_id}"), "/start")
                .await;
            assert_eq!(status, StatusCode::OK);
        }
    }

    pub fn pool(&self) -> &sqlx::SqlitePool {
        &self.state.db
    }
}

// ---------------------------------------------------------------------------
// Update payload builders
// ---------------------------------------------------------------------------

pub fn text_update(sender_id: i64, name: &str, text: &str) -> serde_json::Value {
    serde_json::json!({
        "sender_id": sender_id,
        "display_name": name,
        "message": { "kind": "text", "text": text }
    })
}

pub fn media_update(
    sender_id: i64,
    name: &str,
    kind: &str,
    file_id: &str,
    caption: Option<&str>,
) -> serde_json::Value {
    serde_json::json!({
        "sender_id": sender_id,
        "display_name": name,
        "message": { "kind": kind, "file_id": file_id, "caption": caption }
    })
}

pub fn callback_update(sender_id: i64, action: &str) -> serde_json::Value {
    serde_json::json!({
        "sender_id": sender_id,
        "display_name": "operator",
        "callback": action
    })
}
