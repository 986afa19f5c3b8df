use axum::{Json, debug_handler, extract::State};
use serde::Serialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppResult, chats, config::Config, session::require_student};

use super::{ACCEPTED, FriendRequest, PENDING};

/// One row of the friend list: the accepted request plus the partner's
/// current name and avatar resolved from `users`, and the unread badge for
/// the pair's channel.
#[derive(Clone, Debug, Serialize)]
pub struct FriendEntry {
    pub request_id: String,
    pub student_id: String,
    pub name: String,
    pub photo_url: String,
    pub unread: i64,
}

#[debug_handler]
pub(crate) async fn pending(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Json<Vec<FriendRequest>>> {
    let student_id = require_student(&session).await?;
    Ok(Json(pending_for(&db_pool, &student_id).await?))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn friends(
    State(db_pool): State<SqlitePool>,
    State(config): State<Config>,
    session: Session,
) -> AppResult<Json<Vec<FriendEntry>>> {
    let student_id = require_student(&session).await?;
    Ok(Json(friends_of(&db_pool, &student_id, config.chat_history_limit).await?))
}

pub async fn pending_for(db_pool: &SqlitePool, student_id: &str) -> AppResult<Vec<FriendRequest>> {
    Ok(sqlx::query_as::<_, FriendRequest>(
        "SELECT id,from_id,from_name,to_id,status,created_at FROM requests
         WHERE to_id=? AND status=? ORDER BY created_at DESC",
    )
    .bind(student_id)
    .bind(PENDING)
    .fetch_all(db_pool)
    .await?)
}

/// The accepted request linking two students, if any. Doubles as the
/// friendship check for chat operations.
pub async fn accepted_request_id(
    db_pool: &SqlitePool,
    a: &str,
    b: &str,
) -> AppResult<Option<String>> {
    let row: Option<(String,)> = sqlx::query_as(
        "SELECT id FROM requests
         WHERE status=? AND ((from_id=? AND to_id=?) OR (from_id=? AND to_id=?))",
    )
    .bind(ACCEPTED)
    .bind(a)
    .bind(b)
    .bind(b)
    .bind(a)
    .fetch_optional(db_pool)
    .await?;
    Ok(row.map(|(id,)| id))
}

/// Accepted requests where the student appears on either side, served by the
/// participant indexes instead of scanning the whole collection. The unread
/// badge counts counterpart messages still unread within the newest
/// `history_limit` of each channel, the same window the chat view shows.
pub async fn friends_of(
    db_pool: &SqlitePool,
    student_id: &str,
    history_limit: i64,
) -> AppResult<Vec<FriendEntry>> {
    let rows: Vec<(String, String, String, String)> = sqlx::query_as(
        "SELECT r.id,
                CASE WHEN r.from_id=?1 THEN r.to_id ELSE r.from_id END AS partner_id,
                u.name, u.photo_url
         FROM requests r
         JOIN users u ON u.student_id = CASE WHEN r.from_id=?1 THEN r.to_id ELSE r.from_id END
         WHERE r.status=?2 AND (r.from_id=?1 OR r.to_id=?1)
         ORDER BY r.created_at DESC",
    )
    .bind(student_id)
    .bind(ACCEPTED)
    .fetch_all(db_pool)
    .await?;

    let mut entries = Vec::with_capacity(rows.len());
    for (request_id, partner_id, name, photo_url) in rows {
        let unread =
            unread_count(db_pool, student_id, &partner_id, history_limit).await?;
        entries.push(FriendEntry {
            request_id,
            student_id: partner_id,
            name,
            photo_url,
            unread,
        });
    }
    Ok(entries)
}

async fn unread_count(
    db_pool: &SqlitePool,
    viewer: &str,
    partner: &str,
    history_limit: i64,
) -> AppResult<i64> {
    let channel = chats::channel_id(viewer, partner);
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM
           (SELECT sender_id, read FROM messages WHERE channel_id=?
            ORDER BY created_at DESC, id DESC LIMIT ?)
         WHERE sender_id=? AND read=0",
    )
    .bind(&channel)
    .bind(history_limit)
    .bind(partner)
    .fetch_one(db_pool)
    .await?;
    Ok(count)
}
