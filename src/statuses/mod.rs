mod feed;
mod post;

use axum::{Router, routing::get};
use serde::Serialize;

use crate::AppState;

pub use feed::load_feed;
pub use post::{NewStatusQuery, post_status};

/// One entry on the global feed, stamped with the author's name and avatar
/// at posting time. Nothing expires; the cap at read time is the only bound.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct StatusPost {
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    pub photo_url: String,
    pub text: String,
    pub media_url: Option<String>,
    pub media_kind: Option<String>,
    pub created_at: i64,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(feed::feed).post(post::post))
}
