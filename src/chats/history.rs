use axum::{
    Json, debug_handler,
    extract::{Path, State},
};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppError, AppResult, config::Config, friends, session::require_student};

use super::{Message, channel_id};

#[debug_handler(state = crate::AppState)]
pub(crate) async fn history(
    Path(peer): Path<String>,
    State(db_pool): State<SqlitePool>,
    State(config): State<Config>,
    session: Session,
) -> AppResult<Json<Vec<Message>>> {
    let student_id = require_student(&session).await?;
    if friends::accepted_request_id(&db_pool, &student_id, &peer)
        .await?
        .is_none()
    {
        return Err(AppError::forbidden("you are not friends with this student"));
    }

    let channel = channel_id(&student_id, &peer);
    let batch = load_history(&db_pool, &channel, config.chat_history_limit).await?;
    // Delivering the batch is what marks the counterpart's messages read.
    mark_batch_read(&db_pool, &student_id, &batch).await?;

    Ok(Json(batch))
}

/// The newest `limit` messages of a channel, ascending by time. Anything
/// older than the cap falls out of view.
pub async fn load_history(
    db_pool: &SqlitePool,
    channel: &str,
    limit: i64,
) -> AppResult<Vec<Message>> {
    let mut batch = sqlx::query_as::<_, Message>(
        "SELECT id,channel_id,sender_id,text,media_url,media_kind,read,created_at
         FROM messages WHERE channel_id=?
         ORDER BY created_at DESC, id DESC LIMIT ?",
    )
    .bind(channel)
    .bind(limit)
    .fetch_all(db_pool)
    .await?;

    batch.reverse();
    Ok(batch)
}

/// Marks every unread counterpart message in the delivered batch read, in
/// one grouped write. The viewer's own messages are untouched.
pub async fn mark_batch_read(
    db_pool: &SqlitePool,
    viewer: &str,
    batch: &[Message],
) -> AppResult<usize> {
    let unread: Vec<&Message> = batch
        .iter()
        .filter(|m| m.sender_id != viewer && !m.read)
        .collect();
    if unread.is_empty() {
        return Ok(0);
    }

    let mut tx = db_pool.begin().await?;
    for msg in &unread {
        sqlx::query("UPDATE messages SET read=1 WHERE id=?")
            .bind(&msg.id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    Ok(unread.len())
}
