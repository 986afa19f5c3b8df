mod avatar;
mod page;

use axum::{
    Router,
    routing::{get, post},
};
use serde::Serialize;

use crate::AppState;

pub use avatar::set_avatar;
pub use page::fetch_profile;

/// The public shape of an account. The password hash never leaves `users`.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct UserProfile {
    pub student_id: String,
    pub name: String,
    pub major: String,
    pub photo_url: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/avatar", post(avatar::avatar))
        .route("/{student_id}", get(page::profile))
}
