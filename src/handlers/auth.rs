use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use axum_extra::extract::cookie::PrivateCookieJar;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::db::models::Role;
use crate::error::AppError;
use crate::middleware::auth::{clear_session_cookie, session_cookie};
use crate::router::AppState;
use crate::service::password::{self, MIN_PASSWORD_LEN};

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// POST /api/register -> creates a regular user account.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<Credentials>,
) -> Result<impl IntoResponse, AppError> {
    let username = req.username.trim();
    if username.is_empty() {
        return Err(AppError::Validation("username must not be empty".to_string()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let hash = password::hash_password(&req.password)?;
    let id = state.store.create_user(username, &hash, Role::User).await?;
    info!(user_id = id, "registered new user");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": id, "username": username })),
    ))
}

/// POST /api/login -> verifies credentials and sets the session cookie.
pub async fn login(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Json(req): Json<Credentials>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .store
        .get_user_by_username(req.username.trim())
        .await?
        .ok_or(AppError::InvalidCredentials)?;
    password::verify_password(&req.password, &user.password_hash)?;

    info!(user_id = user.id, "login");
    let jar = jar.add(session_cookie(user.id));
    Ok((
        jar,
        Json(json!({
            "id": user.id,
            "username": user.username,
            "role": user.role,
        })),
    ))
}

/// POST /api/logout -> clears the session cookie.
pub async fn logout(jar: PrivateCookieJar) -> impl IntoResponse {
    let jar = jar.remove(clear_session_cookie());
    (jar, StatusCode::NO_CONTENT)
}
