use axum::{
    Json, debug_handler,
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppError, AppResult, session::require_student};

use super::{ACCEPTED, PENDING, REJECTED};

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestAction {
    Accept,
    Reject,
}

impl RequestAction {
    fn as_status(self) -> &'static str {
        match self {
            RequestAction::Accept => ACCEPTED,
            RequestAction::Reject => REJECTED,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RespondQuery {
    action: RequestAction,
}

#[debug_handler]
pub(crate) async fn respond(
    Path(request_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    session: Session,
    Json(RespondQuery { action }): Json<RespondQuery>,
) -> AppResult<Json<Value>> {
    let student_id = require_student(&session).await?;
    respond_to_request(&db_pool, &request_id, &student_id, action).await?;
    Ok(Json(json!({ "status": action.as_status() })))
}

/// Moves a request out of `pending`. Only the recipient may do it, and both
/// outcomes are terminal.
pub async fn respond_to_request(
    db_pool: &SqlitePool,
    request_id: &str,
    responder: &str,
    action: RequestAction,
) -> AppResult<()> {
    let Some((to_id, status)): Option<(String, String)> =
        sqlx::query_as("SELECT to_id,status FROM requests WHERE id=?")
            .bind(request_id)
            .fetch_optional(db_pool)
            .await?
    else {
        return Err(AppError::not_found("no such request"));
    };

    if to_id != responder {
        return Err(AppError::forbidden("only the recipient can respond"));
    }
    if status != PENDING {
        return Err(AppError::notice("this request was already answered"));
    }

    sqlx::query("UPDATE requests SET status=? WHERE id=?")
        .bind(action.as_status())
        .bind(request_id)
        .execute(db_pool)
        .await?;

    Ok(())
}
