use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::error::AppError;
use crate::models::broadcast::BroadcastContent;

/// A deferred broadcast persisted until it fires.
#[derive(Debug, Clone)]
pub struct PendingBroadcast {
    pub id: i64,
    pub content: BroadcastContent,
    pub due_at: DateTime<Utc>,
    pub operator_id: i64,
}

pub async fn enqueue(
    pool: &SqlitePool,
    content: &BroadcastContent,
    due_at: DateTime<Utc>,
    operator_id: i64,
) -> Result<i64, AppError> {
    let payload =
        serde_json::to_string(content).map_err(|e| AppError::Internal(e.to_string()))?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO broadcast_queue (payload, due_at, operator_id, created_at) \
         VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(&payload)
    .bind(due_at.to_rfc3339())
    .bind(operator_id)
    .bind(Utc::now().to_rfc3339())
    .fetch_one(pool)
    .await?;

    Ok(id)
}

pub async fn delete(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
    sqlx::query("DELETE FROM broadcast_queue WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Load every queued broadcast, oldest due first. Rows whose payload no
/// longer parses are logged and skipped rather than blocking the rest of
/// the queue.
pub async fn load_pending(pool: &SqlitePool) -> Result<Vec<PendingBroadcast>, AppError> {
    let rows = sqlx::query(
        "SELECT id, payload, due_at, operator_id FROM broadcast_queue ORDER BY due_at",
    )
    .fetch_all(pool)
    .await?;

    let mut pending = Vec::with_capacity(rows.len());
    for row in rows {
        let id: i64 = row.get("id");
        let payload: String = row.get("payload");
        let due_at_raw: String = row.get("due_at");

        let content = match serde_json::from_str(&payload) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("skipping queued broadcast {id} with bad payload: {e}");
                continue;
            }
        };
        let due_at = match DateTime::parse_from_rfc3339(&due_at_raw) {
            Ok(t) => t.with_timezone(&Utc),
            Err(e) => {
                tracing::warn!("skipping queued broadcast {id} with bad due time: {e}");
                continue;
            }
        };

        pending.push(PendingBroadcast {
            id,
            content,
            due_at,
            operator_id: row.get("operator_id"),
        });
    }

    Ok(pending)
}

pub async fn count(pool: &SqlitePool) -> Result<i64, AppError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM broadcast_queue")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
