use crate::broadcast::scheduler;
use crate::db;
use crate::models::broadcast::BroadcastContent;
use crate::models::update::{IncomingMessage, Update};
use crate::session::BroadcastSession;
use crate::state::AppState;

pub const CALLBACK_SEND_NOW: &str = "broadcast:now";
pub const CALLBACK_SEND_LATER: &str = "broadcast:later";

const TIMING_PROMPT: &str = "When should this broadcast go out?";
const DELAY_PROMPT: &str = "In how many hours? Fractions are fine, e.g. 0.5 or 2,5.";

/// Entry point for every decoded inbound update. Each update is handled in
/// isolation: every failure is recovered here with at most a reply to the
/// sender, so no update can take the process down or corrupt another
/// update's handling.
pub async fn handle_update(state: &AppState, update: Update) {
    let sender_id = update.sender_id;

    if let Some(action) = update.callback {
        handle_callback(state, sender_id, &action).await;
        return;
    }

    let Some(message) = update.message else {
        tracing::debug!("ignoring empty update from {sender_id}");
        return;
    };

    if let Some(command) = command_of(&message) {
        match command.as_str() {
            "/start" => handle_start(state, sender_id, &update.display_name).await,
            "/broadcast" => handle_broadcast_command(state, sender_id).await,
            "/cancel" => handle_cancel(state, sender_id).await,
            other => {
                tracing::debug!("unknown command {other} from {sender_id}");
            }
        }
        return;
    }

    if state.sessions.is_active(sender_id) {
        handle_session_step(state, sender_id, message).await;
        return;
    }

    // Plain chatter outside any session still refreshes the sender's
    // registry record, silently.
    if let Err(e) = db::users::upsert_user(&state.db, sender_id, &update.display_name).await {
        tracing::warn!("could not refresh user {sender_id}: {e:?}");
    }
}

/// The leading `/command` token of a text message, with any bot-name
/// suffix (`/start@heraldbot`) stripped.
fn command_of(message: &IncomingMessage) -> Option<String> {
    let text = message.as_text()?.trim();
    if !text.starts_with('/') {
        return None;
    }
    let token = text.split_whitespace().next()?;
    let command = token.split('@').next()?;
    Some(command.to_string())
}

async fn handle_start(state: &AppState, sender_id: i64, display_name: &str) {
    match db::users::upsert_user(&state.db, sender_id, display_name).await {
        Ok(true) => {
            tracing::info!("registered new user {sender_id}");
            reply(state, sender_id, "Welcome! You are now registered and will receive announcements.").await;
        }
        Ok(false) => {
            reply(state, sender_id, "Welcome back! You are already registered.").await;
        }
        Err(e) => {
            tracing::error!("registration failed for {sender_id}: {e:?}");
            reply(state, sender_id, "Something went wrong, please try again later.").await;
        }
    }
}

async fn handle_broadcast_command(state: &AppState, sender_id: i64) {
    if !state.is_operator(sender_id) {
        tracing::warn!("denied /broadcast from non-operator {sender_id}");
        reply(state, sender_id, "You are not allowed to send broadcasts.").await;
        return;
    }

    let audience = match db::users::count_users(&state.db).await {
        Ok(count) => count,
        Err(e) => {
            tracing::error!("could not count audience for {sender_id}: {e:?}");
            reply(state, sender_id, "Something went wrong, please try again later.").await;
            return;
        }
    };

    state.sessions.begin(sender_id);
    reply(
        state,
        sender_id,
        &format!(
            "Composing a broadcast to {audience} user(s). Send the message \
             (text, photo, video, or document). /cancel to abort."
        ),
    )
    .await;
}

async fn handle_cancel(state: &AppState, sender_id: i64) {
    if state.sessions.remove(sender_id).is_some() {
        reply(state, sender_id, "Broadcast cancelled.").await;
    } else {
        reply(state, sender_id, "Nothing to cancel.").await;
    }
}

async fn handle_session_step(state: &AppState, sender_id: i64, message: IncomingMessage) {
    let Some(session) = state.sessions.get(sender_id) else {
        return;
    };

    match session {
        BroadcastSession::AwaitingContent => match message.into_content() {
            Some(content) => {
                state
                    .sessions
                    .set(sender_id, BroadcastSession::AwaitingTiming { content });
                prompt_timing(state, sender_id).await;
            }
            None => {
                reply(
                    state,
                    sender_id,
                    "That content type is not supported. Send text, a photo, a video, or a document.",
                )
                .await;
            }
        },
        BroadcastSession::AwaitingTiming { .. } => {
            // The timing choice arrives as a callback action, not a message.
            prompt_timing(state, sender_id).await;
        }
        BroadcastSession::AwaitingDelay { content } => {
            let delay_secs = message.as_text().and_then(parse_delay_hours);
            match delay_secs {
                Some(delay_secs) => {
                    state.sessions.remove(sender_id);
                    finalize(state, sender_id, content, delay_secs).await;
                }
                None => {
                    reply(state, sender_id, DELAY_PROMPT).await;
                }
            }
        }
    }
}

async fn handle_callback(state: &AppState, sender_id: i64, action: &str) {
    let Some(BroadcastSession::AwaitingTiming { content }) = state.sessions.get(sender_id) else {
        tracing::debug!("ignoring callback {action} from {sender_id} with no timing choice pending");
        return;
    };

    match action {
        CALLBACK_SEND_NOW => {
            state.sessions.remove(sender_id);
            finalize(state, sender_id, content, 0).await;
        }
        CALLBACK_SEND_LATER => {
            state
                .sessions
                .set(sender_id, BroadcastSession::AwaitingDelay { content });
            reply(state, sender_id, DELAY_PROMPT).await;
        }
        other => {
            tracing::debug!("unknown callback action {other} from {sender_id}");
        }
    }
}

/// Session is over; hand the finalized content to the scheduler.
async fn finalize(state: &AppState, operator_id: i64, content: BroadcastContent, delay_secs: u64) {
    if delay_secs > 0 {
        reply(
            state,
            operator_id,
            &format!("Broadcast scheduled, firing in {delay_secs}s."),
        )
        .await;
    } else {
        reply(state, operator_id, "Sending now...").await;
    }

    if let Err(e) = scheduler::schedule(state, content, delay_secs, operator_id).await {
        tracing::error!("could not schedule broadcast for {operator_id}: {e:?}");
        reply(state, operator_id, "Something went wrong, the broadcast was not scheduled.").await;
    }
}

async fn prompt_timing(state: &AppState, sender_id: i64) {
    let result = state
        .transport
        .send_choices(
            sender_id,
            TIMING_PROMPT,
            &[
                ("Send now", CALLBACK_SEND_NOW),
                ("Send later", CALLBACK_SEND_LATER),
            ],
        )
        .await;
    if let Err(e) = result {
        tracing::warn!("could not send timing prompt to {sender_id}: {e}");
    }
}

async fn reply(state: &AppState, chat_id: i64, text: &str) {
    if let Err(e) = state.transport.send_text(chat_id, text).await {
        tracing::warn!("could not reply to {chat_id}: {e}");
    }
}

/// Longest accepted delay. Anything further out than a year is treated as
/// a typo, and the cap keeps the seconds value far inside what the
/// scheduler's time arithmetic can represent.
const MAX_DELAY_HOURS: f64 = 24.0 * 365.0;

/// Parse a delay expressed in hours ("2", "2.5", "2,5") into whole
/// seconds. Returns `None` for anything non-numeric, negative, or beyond
/// `MAX_DELAY_HOURS`.
fn parse_delay_hours(input: &str) -> Option<u64> {
    let normalized = input.trim().replace(',', ".");
    let hours: f64 = normalized.parse().ok()?;
    if !hours.is_finite() || hours < 0.0 || hours > MAX_DELAY_HOURS {
        return None;
    }
    Some((hours * 3600.0).round() as u64)
}
