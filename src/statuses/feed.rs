use axum::{Json, debug_handler, extract::State};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppResult, config::Config, session::require_student};

use super::StatusPost;

#[debug_handler(state = crate::AppState)]
pub(crate) async fn feed(
    State(db_pool): State<SqlitePool>,
    State(config): State<Config>,
    session: Session,
) -> AppResult<Json<Vec<StatusPost>>> {
    require_student(&session).await?;
    Ok(Json(load_feed(&db_pool, config.status_feed_limit).await?))
}

/// Newest-first global feed, capped. Everyone sees the same list.
pub async fn load_feed(db_pool: &SqlitePool, limit: i64) -> AppResult<Vec<StatusPost>> {
    Ok(sqlx::query_as::<_, StatusPost>(
        "SELECT id,author_id,author_name,photo_url,text,media_url,media_kind,created_at
         FROM statuses ORDER BY created_at DESC, id DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(db_pool)
    .await?)
}
