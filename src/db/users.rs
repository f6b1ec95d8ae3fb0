use sqlx::{Row, SqlitePool};

use crate::error::AppError;
use crate::models::user::User;

fn row_to_user(row: sqlx::sqlite::SqliteRow) -> User {
    User {
        id: row.get("id"),
        chat_id: row.get("chat_id"),
        display_name: row.get("display_name"),
        first_seen: row.get("first_seen"),
        last_interaction: row.get("last_interaction"),
    }
}

/// Register or refresh a user. Returns `true` when the row was newly
/// created.
///
/// The is-new signal is the presence of a returned row from the
/// `ON CONFLICT DO NOTHING RETURNING` insert, so it holds under concurrent
/// calls for the same `chat_id`: exactly one caller observes the insert,
/// every other caller falls through to the update.
pub async fn upsert_user(
    pool: &SqlitePool,
    chat_id: i64,
    display_name: &str,
) -> Result<bool, AppError> {
    let now = chrono::Utc::now().to_rfc3339();

    let inserted: Option<i64> = sqlx::query_scalar(
        "INSERT INTO users (chat_id, display_name, first_seen, last_interaction) \
         VALUES (?, ?, ?, ?) \
         ON CONFLICT (chat_id) DO NOTHING \
         RETURNING id",
    )
    .bind(chat_id)
    .bind(display_name)
    .bind(&now)
    .bind(&now)
    .fetch_optional(pool)
    .await?;

    if inserted.is_some() {
        return Ok(true);
    }

    sqlx::query("UPDATE users SET display_name = ?, last_interaction = ? WHERE chat_id = ?")
        .bind(display_name)
        .bind(&now)
        .bind(chat_id)
        .execute(pool)
        .await?;

    Ok(false)
}

/// One consistent read of every recipient identifier, in registration
/// order. Users registered after the snapshot is taken are not part of an
/// in-flight dispatch.
pub async fn snapshot_recipient_ids(pool: &SqlitePool) -> Result<Vec<i64>, AppError> {
    let rows = sqlx::query_scalar::<_, i64>("SELECT chat_id FROM users ORDER BY id")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn count_users(pool: &SqlitePool) -> Result<i64, AppError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn get_user(pool: &SqlitePool, chat_id: i64) -> Result<User, AppError> {
    let row = sqlx::query(
        "SELECT id, chat_id, display_name, first_seen, last_interaction \
         FROM users WHERE chat_id = ?",
    )
    .bind(chat_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("unknown_user".to_string()))?;

    Ok(row_to_user(row))
}
