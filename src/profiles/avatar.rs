use axum::{Json, debug_handler, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppError, AppResult, config::Config, session::require_student};

#[derive(Debug, Deserialize)]
pub struct AvatarQuery {
    pub photo_url: String,
}

/// Replaces the caller's avatar reference. Last write wins; there is no
/// coordination between concurrent updates.
#[debug_handler(state = crate::AppState)]
pub(crate) async fn avatar(
    State(db_pool): State<SqlitePool>,
    State(config): State<Config>,
    session: Session,
    Json(AvatarQuery { photo_url }): Json<AvatarQuery>,
) -> AppResult<Json<Value>> {
    let student_id = require_student(&session).await?;
    set_avatar(&db_pool, config.media_max_bytes, &student_id, &photo_url).await?;
    Ok(Json(json!({ "status": "updated" })))
}

pub async fn set_avatar(
    db_pool: &SqlitePool,
    media_max_bytes: usize,
    student_id: &str,
    photo_url: &str,
) -> AppResult<()> {
    if photo_url.len() > media_max_bytes {
        return Err(AppError::notice("photo too large (max 1.5MB)"));
    }

    sqlx::query("UPDATE users SET photo_url=? WHERE student_id=?")
        .bind(photo_url)
        .bind(student_id)
        .execute(db_pool)
        .await?;

    Ok(())
}
