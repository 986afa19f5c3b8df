mod delete;
mod history;
mod send;
mod ws;

use axum::{
    Router,
    routing::{delete as delete_route, get, post},
};
use serde::{Deserialize, Serialize};

use crate::AppState;

pub use delete::delete_chat;
pub use history::{load_history, mark_batch_read};
pub use send::{SendMessageQuery, send_msg};

/// One chat message. `read` flips when the counterpart's view delivers it.
#[derive(Clone, Debug, Deserialize, Serialize, sqlx::FromRow)]
pub struct Message {
    pub id: String,
    pub channel_id: String,
    pub sender_id: String,
    pub text: String,
    pub media_url: Option<String>,
    pub media_kind: Option<String>,
    pub read: bool,
    pub created_at: i64,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

/// The per-pair channel key: both ids sorted, joined with `_`. Identical no
/// matter which side derives it, so both participants land on one channel.
pub fn channel_id(a: &str, b: &str) -> String {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    format!("{lo}_{hi}")
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{peer}/send", post(send::send))
        .route("/{peer}/history", get(history::history))
        .route("/{peer}/ws", get(ws::chat_ws))
        .route("/{peer}", delete_route(delete::delete))
}

#[cfg(test)]
mod tests {
    use super::channel_id;

    #[test]
    fn channel_id_is_order_independent() {
        assert_eq!(channel_id("1001", "1002"), channel_id("1002", "1001"));
        assert_eq!(channel_id("1001", "1002"), "1001_1002");
    }

    #[test]
    fn channel_id_sorts_lexicographically() {
        // "2" > "10" lexicographically; the key follows string order, not
        // numeric order, on both sides alike.
        assert_eq!(channel_id("2", "10"), "10_2");
        assert_eq!(channel_id("10", "2"), "10_2");
    }

    #[test]
    fn channel_id_of_equal_ids_is_stable() {
        assert_eq!(channel_id("7", "7"), "7_7");
    }
}
