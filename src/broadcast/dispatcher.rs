use futures_util::stream::{self, StreamExt};

use crate::db;
use crate::models::broadcast::BroadcastContent;
use crate::state::AppState;

/// In-flight sends per broadcast. The accounting contract does not depend
/// on this value: `sent + failed` always equals the snapshot size.
const SEND_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub sent: usize,
    pub failed: usize,
}

/// Fan a finalized broadcast out to every registered user.
///
/// Takes one recipient snapshot, attempts exactly one send per recipient,
/// counts each outcome, and reports a single summary back to the
/// initiating operator. A failed recipient never aborts the batch and is
/// never retried.
pub async fn dispatch(
    state: &AppState,
    content: &BroadcastContent,
    operator_id: i64,
) -> DispatchOutcome {
    let recipients = match db::users::snapshot_recipient_ids(&state.db).await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::error!("broadcast aborted, could not snapshot recipients: {e:?}");
            notify_operator(state, operator_id, "Broadcast failed: could not load the recipient list.")
                .await;
            return DispatchOutcome { sent: 0, failed: 0 };
        }
    };

    let total = recipients.len();
    tracing::info!(
        "dispatching {} broadcast to {total} recipient(s)",
        content.kind()
    );

    let results: Vec<(i64, Result<(), _>)> = stream::iter(recipients)
        .map(|chat_id| {
            let transport = state.transport.clone();
            let content = content.clone();
            async move { (chat_id, transport.send_to(chat_id, &content).await) }
        })
        .buffer_unordered(SEND_CONCURRENCY)
        .collect()
        .await;

    let mut sent = 0;
    let mut failed = 0;
    for (chat_id, result) in results {
        match result {
            Ok(()) => sent += 1,
            Err(e) => {
                failed += 1;
                tracing::warn!("delivery to {chat_id} failed: {e}");
            }
        }
    }

    notify_operator(
        state,
        operator_id,
        &format!("Broadcast finished: {sent} delivered, {failed} failed ({total} recipients)."),
    )
    .await;

    DispatchOutcome { sent, failed }
}

async fn notify_operator(state: &AppState, operator_id: i64, text: &str) {
    if let Err(e) = state.transport.send_text(operator_id, text).await {
        tracing::warn!("could not deliver summary to operator {operator_id}: {e}");
    }
}
