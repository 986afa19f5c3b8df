use axum::{Json, debug_handler, extract::State};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{
    AppError, AppResult,
    profiles::UserProfile,
    session::{ANON_UID, STUDENT_ID},
};

use super::hash_password;

#[derive(Debug, Deserialize)]
pub struct RegisterQuery {
    pub student_id: String,
    pub name: String,
    pub password: String,
    #[serde(default)]
    pub major: String,
}

pub struct NewProfile {
    pub student_id: String,
    pub name: String,
    pub password: String,
    pub major: String,
    pub uid: String,
}

#[debug_handler]
pub(crate) async fn register(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Json(RegisterQuery { student_id, name, password, major }): Json<RegisterQuery>,
) -> AppResult<Json<UserProfile>> {
    let Some(uid) = session.get::<String>(ANON_UID).await? else {
        return Err(AppError::unauthorized("not connected yet, call /connect first"));
    };

    let profile = register_profile(
        &db_pool,
        NewProfile { student_id, name, password, major, uid },
    )
    .await?;

    session.insert(STUDENT_ID, profile.student_id.clone()).await?;
    tracing::info!(student_id = %profile.student_id, "registered {}", profile.name);

    Ok(Json(profile))
}

/// Creates the profile row, failing without touching anything if the id is
/// taken. The stored password is an argon2 hash, never the cleartext.
pub async fn register_profile(db_pool: &SqlitePool, new: NewProfile) -> AppResult<UserProfile> {
    if new.student_id.is_empty() || new.name.is_empty() || new.password.is_empty() {
        return Err(AppError::notice("student id, name and password are required"));
    }
    if !new.student_id.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::notice("student id must be digits only"));
    }

    let exists: Option<(String,)> = sqlx::query_as("SELECT student_id FROM users WHERE student_id=?")
        .bind(&new.student_id)
        .fetch_optional(db_pool)
        .await?;
    if exists.is_some() {
        return Err(AppError::notice("this student id is already registered"));
    }

    let photo_url = format!("https://api.dicebear.com/7.x/avataaars/svg?seed={}", new.name);
    sqlx::query(
        "INSERT INTO users (student_id,name,password_hash,major,photo_url,uid) VALUES (?,?,?,?,?,?)",
    )
    .bind(&new.student_id)
    .bind(&new.name)
    .bind(hash_password(&new.password)?)
    .bind(&new.major)
    .bind(&photo_url)
    .bind(&new.uid)
    .execute(db_pool)
    .await?;

    Ok(UserProfile {
        student_id: new.student_id,
        name: new.name,
        major: new.major,
        photo_url,
    })
}
