use axum::{Json, debug_handler, extract::State};
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{AppError, AppResult, now_ms, session::require_student};

use super::{ACCEPTED, FriendRequest, PENDING, SendRequestQuery};

#[debug_handler]
pub(crate) async fn request(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Json(SendRequestQuery { to }): Json<SendRequestQuery>,
) -> AppResult<Json<FriendRequest>> {
    let student_id = require_student(&session).await?;
    Ok(Json(send_request(&db_pool, &student_id, &to).await?))
}

/// Creates a pending request toward `to`, refusing duplicates: a pair with a
/// pending or accepted request in either direction cannot get a second one.
pub async fn send_request(db_pool: &SqlitePool, from: &str, to: &str) -> AppResult<FriendRequest> {
    if to == from {
        return Err(AppError::notice("cannot send a request to yourself"));
    }

    let Some((from_name,)): Option<(String,)> =
        sqlx::query_as("SELECT name FROM users WHERE student_id=?")
            .bind(from)
            .fetch_optional(db_pool)
            .await?
    else {
        return Err(AppError::not_found("sender profile missing"));
    };

    let target: Option<(String,)> = sqlx::query_as("SELECT name FROM users WHERE student_id=?")
        .bind(to)
        .fetch_optional(db_pool)
        .await?;
    if target.is_none() {
        return Err(AppError::not_found("student id not found"));
    }

    let existing: Option<(String,)> = sqlx::query_as(
        "SELECT id FROM requests
         WHERE status IN (?, ?)
           AND ((from_id=? AND to_id=?) OR (from_id=? AND to_id=?))",
    )
    .bind(PENDING)
    .bind(ACCEPTED)
    .bind(from)
    .bind(to)
    .bind(to)
    .bind(from)
    .fetch_optional(db_pool)
    .await?;
    if existing.is_some() {
        return Err(AppError::notice("a request between you already exists"));
    }

    let req = FriendRequest {
        id: Uuid::now_v7().to_string(),
        from_id: from.to_owned(),
        from_name,
        to_id: to.to_owned(),
        status: PENDING.to_owned(),
        created_at: now_ms(),
    };

    sqlx::query(
        "INSERT INTO requests (id,from_id,from_name,to_id,status,created_at) VALUES (?,?,?,?,?,?)",
    )
    .bind(&req.id)
    .bind(&req.from_id)
    .bind(&req.from_name)
    .bind(&req.to_id)
    .bind(&req.status)
    .bind(req.created_at)
    .execute(db_pool)
    .await?;

    Ok(req)
}
