use axum::{
    Json, debug_handler,
    extract::{Path, State},
};
use serde::Serialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppError, AppResult, config::Config, friends, session::require_student};

use super::channel_id;

#[derive(Debug, Serialize)]
pub struct DeleteSummary {
    pub deleted_messages: u64,
    pub complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn delete(
    Path(peer): Path<String>,
    State(db_pool): State<SqlitePool>,
    State(config): State<Config>,
    session: Session,
) -> AppResult<Json<DeleteSummary>> {
    let student_id = require_student(&session).await?;
    Ok(Json(
        delete_chat(&db_pool, config.delete_batch_size, &student_id, &peer).await?,
    ))
}

/// Removes up to one batch of the channel's messages plus the friend request
/// linking the pair, in a single transaction. A conversation longer than the
/// batch keeps its overflow; the summary says so instead of pretending
/// otherwise.
pub async fn delete_chat(
    db_pool: &SqlitePool,
    batch_size: i64,
    student_id: &str,
    peer: &str,
) -> AppResult<DeleteSummary> {
    let Some(request_id) = friends::accepted_request_id(db_pool, student_id, peer).await? else {
        return Err(AppError::not_found("no chat with this student"));
    };
    let channel = channel_id(student_id, peer);

    let mut tx = db_pool.begin().await?;
    let deleted = sqlx::query(
        "DELETE FROM messages WHERE id IN
         (SELECT id FROM messages WHERE channel_id=? ORDER BY created_at ASC LIMIT ?)",
    )
    .bind(&channel)
    .bind(batch_size)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    sqlx::query("DELETE FROM requests WHERE id=?")
        .bind(&request_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    let complete = deleted < batch_size as u64;
    Ok(DeleteSummary {
        deleted_messages: deleted,
        complete,
        warning: (!complete)
            .then(|| "some messages may remain beyond the deletion batch".to_owned()),
    })
}
