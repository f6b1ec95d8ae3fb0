use dashmap::DashMap;
use std::sync::Arc;

use crate::models::broadcast::BroadcastContent;

/// One operator's in-progress broadcast composition. Each variant carries
/// only the fields valid in that state; idle operators simply have no entry
/// in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastSession {
    AwaitingContent,
    AwaitingTiming { content: BroadcastContent },
    AwaitingDelay { content: BroadcastContent },
}

/// In-memory session map keyed by operator identifier. Constructed once and
/// carried in `AppState`; sessions for different operators never interact.
///
/// Process-local only: running multiple instances breaks mid-conversation
/// continuity for an operator (known scaling limitation).
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<DashMap<i64, BroadcastSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) a session in `AwaitingContent`.
    pub fn begin(&self, operator_id: i64) {
        self.inner
            .insert(operator_id, BroadcastSession::AwaitingContent);
    }

    pub fn get(&self, operator_id: i64) -> Option<BroadcastSession> {
        self.inner.get(&operator_id).map(|s| s.clone())
    }

    pub fn set(&self, operator_id: i64, session: BroadcastSession) {
        self.inner.insert(operator_id, session);
    }

    /// End the session, returning whatever state it held.
    pub fn remove(&self, operator_id: i64) -> Option<BroadcastSession> {
        self.inner.remove(&operator_id).map(|(_, s)| s)
    }

    pub fn is_active(&self, operator_id: i64) -> bool {
        self.inner.contains_key(&operator_id)
    }
}
