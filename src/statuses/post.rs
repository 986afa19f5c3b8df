use axum::{Json, debug_handler, extract::State};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{
    AppError, AppResult, chats::MediaKind, config::Config, now_ms, profiles,
    session::require_student,
};

use super::StatusPost;

#[derive(Debug, Deserialize)]
pub struct NewStatusQuery {
    #[serde(default)]
    pub text: String,
    pub media_url: Option<String>,
    pub media_kind: Option<MediaKind>,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn post(
    State(db_pool): State<SqlitePool>,
    State(config): State<Config>,
    session: Session,
    Json(query): Json<NewStatusQuery>,
) -> AppResult<Json<StatusPost>> {
    let student_id = require_student(&session).await?;
    Ok(Json(
        post_status(&db_pool, config.media_max_bytes, &student_id, query).await?,
    ))
}

pub async fn post_status(
    db_pool: &SqlitePool,
    media_max_bytes: usize,
    author_id: &str,
    NewStatusQuery { text, media_url, media_kind }: NewStatusQuery,
) -> AppResult<StatusPost> {
    if text.trim().is_empty() && media_url.is_none() {
        return Err(AppError::notice("a status needs text or media"));
    }
    if let Some(media) = &media_url {
        if media.len() > media_max_bytes {
            return Err(AppError::notice("file too large (max 1.5MB)"));
        }
        if media_kind.is_none() {
            return Err(AppError::notice("media_kind is required with media"));
        }
    }

    let author = profiles::fetch_profile(db_pool, author_id).await?;
    let status = StatusPost {
        id: Uuid::now_v7().to_string(),
        author_id: author.student_id,
        author_name: author.name,
        photo_url: author.photo_url,
        text,
        media_url,
        media_kind: media_kind.map(|k| k.as_str().to_owned()),
        created_at: now_ms(),
    };

    sqlx::query(
        "INSERT INTO statuses (id,author_id,author_name,photo_url,text,media_url,media_kind,created_at)
         VALUES (?,?,?,?,?,?,?,?)",
    )
    .bind(&status.id)
    .bind(&status.author_id)
    .bind(&status.author_name)
    .bind(&status.photo_url)
    .bind(&status.text)
    .bind(&status.media_url)
    .bind(&status.media_kind)
    .bind(status.created_at)
    .execute(db_pool)
    .await?;

    Ok(status)
}
