use sqlx::SqlitePool;
use std::collections::HashSet;
use std::sync::Arc;

use crate::session::SessionStore;
use crate::transport::Transport;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub sessions: SessionStore,
    pub transport: Arc<dyn Transport>,
    pub operators: Arc<HashSet<i64>>,
}

impl AppState {
    pub fn is_operator(&self, sender_id: i64) -> bool {
        self.operators.contains(&sender_id)
    }
}
