pub mod auth;
pub mod chats;
pub mod config;
pub mod db;
pub mod friends;
pub mod profiles;
pub mod session;
pub mod statuses;

use axum::{
    Json,
    extract::FromRef,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use sqlx::SqlitePool;
use tokio::sync::broadcast;

use crate::config::Config;

/// One event on the live feed: a stored chat message, tagged with its
/// channel so each WebSocket task keeps only its own channel's traffic.
#[derive(Clone, Debug)]
pub struct ChannelEvent {
    pub channel_id: String,
    pub payload: String,
}

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub config: Config,
    pub tx: broadcast::Sender<ChannelEvent>,
}

pub type AppResult<T> = Result<T, AppError>;

/// Anyhow-backed handler error. Anything bubbling up via `?` is a 500;
/// user-facing notices (validation, not-found, wrong password) are built
/// through the constructors and keep their message on the wire.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub inner: anyhow::Error,
}

impl AppError {
    pub fn notice(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            inner: anyhow::Error::msg(msg.into()),
        }
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            inner: anyhow::Error::msg(msg.into()),
        }
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            inner: anyhow::Error::msg(msg.into()),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            inner: anyhow::Error::msg(msg.into()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("internal error: {}\n{}", self.inner, self.inner.backtrace());
        }
        (self.status, Json(json!({ "error": self.inner.to_string() }))).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            inner: err.into(),
        }
    }
}

/// Unix milliseconds; the ordering key for messages, requests and statuses.
pub fn now_ms() -> i64 {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
