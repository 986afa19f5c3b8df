use axum::{Json, debug_handler};
use serde_json::{Value, json};
use tower_sessions::Session;
use uuid::Uuid;

use crate::{AppError, AppResult};

/// Active profile's student id, set by register/login.
pub const STUDENT_ID: &str = "student_id";
/// Anonymous uid handed out by `/connect`; consumed only as the ownership
/// field on the profile created at registration.
pub const ANON_UID: &str = "anon_uid";

/// `POST /connect`. Issues the anonymous session uid if this session does
/// not already have one. Failure here is a notice, never a retry loop.
#[debug_handler]
pub async fn connect(session: Session) -> AppResult<Json<Value>> {
    let uid = match session.get::<String>(ANON_UID).await? {
        Some(uid) => uid,
        None => {
            let uid = Uuid::now_v7().to_string();
            session.insert(ANON_UID, uid.clone()).await?;
            uid
        }
    };

    Ok(Json(json!({ "status": "connected", "uid": uid })))
}

/// The logged-in student id, or a 401 notice for handlers that need one.
pub async fn require_student(session: &Session) -> AppResult<String> {
    session
        .get::<String>(STUDENT_ID)
        .await?
        .ok_or_else(|| AppError::unauthorized("not logged in"))
}
