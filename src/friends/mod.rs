mod list;
mod request;
mod respond;

use axum::{
    Router,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::AppState;

pub use list::{FriendEntry, accepted_request_id, friends_of, pending_for};
pub use request::send_request;
pub use respond::{RequestAction, respond_to_request};

/// The sole friendship record. `accepted` doubles as the friend-list source
/// of truth; `rejected` is terminal but leaves the pair free to try again.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct FriendRequest {
    pub id: String,
    pub from_id: String,
    pub from_name: String,
    pub to_id: String,
    pub status: String,
    pub created_at: i64,
}

pub const PENDING: &str = "pending";
pub const ACCEPTED: &str = "accepted";
pub const REJECTED: &str = "rejected";

#[derive(Debug, Deserialize)]
pub struct SendRequestQuery {
    pub to: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/request", post(request::request))
        .route("/{id}/respond", post(respond::respond))
        .route("/pending", get(list::pending))
        .route("/list", get(list::friends))
}
