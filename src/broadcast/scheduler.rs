use chrono::{Duration, Utc};

use super::dispatcher;
use crate::db;
use crate::error::AppError;
use crate::models::broadcast::BroadcastContent;
use crate::state::AppState;

/// Run a finalized broadcast now or after `delay_secs`.
///
/// An immediate broadcast is dispatched inline as part of handling the
/// triggering update. A deferred one is persisted to the queue table and
/// armed as a detached task, so the call returns as soon as the row is
/// written; there is no cancellation once scheduled.
pub async fn schedule(
    state: &AppState,
    content: BroadcastContent,
    delay_secs: u64,
    operator_id: i64,
) -> Result<(), AppError> {
    if delay_secs == 0 {
        dispatcher::dispatch(state, &content, operator_id).await;
        return Ok(());
    }

    let due_at = Utc::now() + Duration::seconds(delay_secs as i64);
    let task_id = db::queue::enqueue(&state.db, &content, due_at, operator_id).await?;
    tracing::info!("broadcast {task_id} queued, firing in {delay_secs}s");

    arm(state.clone(), task_id, content, delay_secs, operator_id);
    Ok(())
}

/// Re-arm every queued broadcast that survived a restart. Overdue entries
/// fire immediately. Returns how many were re-armed.
pub async fn reconcile(state: &AppState) -> Result<usize, AppError> {
    let pending = db::queue::load_pending(&state.db).await?;
    let count = pending.len();

    for task in pending {
        let remaining = (task.due_at - Utc::now()).num_seconds().max(0) as u64;
        tracing::info!("re-armed broadcast {} firing in {remaining}s", task.id);
        arm(
            state.clone(),
            task.id,
            task.content,
            remaining,
            task.operator_id,
        );
    }

    Ok(count)
}

fn arm(
    state: AppState,
    task_id: i64,
    content: BroadcastContent,
    delay_secs: u64,
    operator_id: i64,
) {
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_secs(delay_secs)).await;
        dispatcher::dispatch(&state, &content, operator_id).await;
        // Only a fired broadcast leaves the queue; a crash before this
        // point is picked up by reconcile() on the next start.
        if let Err(e) = db::queue::delete(&state.db, task_id).await {
            tracing::error!("could not remove fired broadcast {task_id}: {e:?}");
        }
    });
}
