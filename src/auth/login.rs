use axum::{Json, debug_handler, extract::State};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppError, AppResult, profiles::UserProfile, session::STUDENT_ID};

use super::password_matches;

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub student_id: String,
    pub password: String,
}

#[debug_handler]
pub(crate) async fn login(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Json(LoginQuery { student_id, password }): Json<LoginQuery>,
) -> AppResult<Json<UserProfile>> {
    let profile = verify_login(&db_pool, &student_id, &password).await?;

    // Only a verified password establishes the session.
    session.insert(STUDENT_ID, profile.student_id.clone()).await?;
    tracing::info!(student_id = %profile.student_id, "logged in");

    Ok(Json(profile))
}

pub async fn verify_login(
    db_pool: &SqlitePool,
    student_id: &str,
    password: &str,
) -> AppResult<UserProfile> {
    let Some((name, hash, major, photo_url)): Option<(String, String, String, String)> =
        sqlx::query_as("SELECT name,password_hash,major,photo_url FROM users WHERE student_id=?")
            .bind(student_id)
            .fetch_optional(db_pool)
            .await?
    else {
        return Err(AppError::not_found("student id not found, register first"));
    };

    if !password_matches(password, &hash)? {
        return Err(AppError::unauthorized("wrong password"));
    }

    Ok(UserProfile {
        student_id: student_id.to_owned(),
        name,
        major,
        photo_url,
    })
}
