use axum::{
    Json, debug_handler,
    extract::{Path, State},
};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppError, AppResult, session::require_student};

use super::UserProfile;

#[debug_handler]
pub(crate) async fn profile(
    Path(student_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Json<UserProfile>> {
    require_student(&session).await?;
    Ok(Json(fetch_profile(&db_pool, &student_id).await?))
}

pub async fn fetch_profile(db_pool: &SqlitePool, student_id: &str) -> AppResult<UserProfile> {
    sqlx::query_as::<_, UserProfile>(
        "SELECT student_id,name,major,photo_url FROM users WHERE student_id=?",
    )
    .bind(student_id)
    .fetch_optional(db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("no such student"))
}
