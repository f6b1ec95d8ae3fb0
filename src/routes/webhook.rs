use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::bot;
use crate::models::update::Update;
use crate::state::AppState;

/// Ingress boundary: the wire protocol is the platform's problem, this
/// endpoint receives already-decoded update objects. It always
/// acknowledges so the platform does not redeliver; failures inside the
/// handler are dealt with there.
pub async fn receive_update(
    State(state): State<AppState>,
    Json(update): Json<Update>,
) -> StatusCode {
    bot::handle_update(&state, update).await;
    StatusCode::OK
}
