use axum::{
    Json, debug_handler,
    extract::{Path, State},
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tokio::sync::broadcast;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{
    AppError, AppResult, ChannelEvent, config::Config, friends, now_ms, session::require_student,
};

use super::{MediaKind, Message, channel_id};

#[derive(Debug, Deserialize)]
pub struct SendMessageQuery {
    #[serde(default)]
    pub text: String,
    pub media_url: Option<String>,
    pub media_kind: Option<MediaKind>,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn send(
    Path(peer): Path<String>,
    State(db_pool): State<SqlitePool>,
    State(config): State<Config>,
    State(tx): State<broadcast::Sender<ChannelEvent>>,
    session: Session,
    Json(query): Json<SendMessageQuery>,
) -> AppResult<Json<Message>> {
    let student_id = require_student(&session).await?;
    let msg = send_msg(&db_pool, &tx, &config, &student_id, &peer, query).await?;
    Ok(Json(msg))
}

/// Validates, appends the message and pushes it onto the live feed. The
/// media size check runs before anything touches the store.
pub async fn send_msg(
    db_pool: &SqlitePool,
    tx: &broadcast::Sender<ChannelEvent>,
    config: &Config,
    sender_id: &str,
    peer_id: &str,
    SendMessageQuery { text, media_url, media_kind }: SendMessageQuery,
) -> AppResult<Message> {
    if text.trim().is_empty() && media_url.is_none() {
        return Err(AppError::notice("a message needs text or media"));
    }
    if let Some(media) = &media_url {
        if media.len() > config.media_max_bytes {
            return Err(AppError::notice("file too large (max 1.5MB)"));
        }
        if media_kind.is_none() {
            return Err(AppError::notice("media_kind is required with media"));
        }
    }

    if friends::accepted_request_id(db_pool, sender_id, peer_id)
        .await?
        .is_none()
    {
        return Err(AppError::forbidden("you are not friends with this student"));
    }

    let msg = Message {
        id: Uuid::now_v7().to_string(),
        channel_id: channel_id(sender_id, peer_id),
        sender_id: sender_id.to_owned(),
        text,
        media_url,
        media_kind: media_kind.map(|k| k.as_str().to_owned()),
        read: false,
        created_at: now_ms(),
    };

    sqlx::query(
        "INSERT INTO messages (id,channel_id,sender_id,text,media_url,media_kind,read,created_at)
         VALUES (?,?,?,?,?,?,?,?)",
    )
    .bind(&msg.id)
    .bind(&msg.channel_id)
    .bind(&msg.sender_id)
    .bind(&msg.text)
    .bind(&msg.media_url)
    .bind(&msg.media_kind)
    .bind(msg.read)
    .bind(msg.created_at)
    .execute(db_pool)
    .await?;

    // Nobody subscribed is fine.
    let _ = tx.send(ChannelEvent {
        channel_id: msg.channel_id.clone(),
        payload: serde_json::to_string(&msg)?,
    });

    Ok(msg)
}
