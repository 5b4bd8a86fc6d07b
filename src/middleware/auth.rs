//! Session authentication.
//!
//! The session is a private (encrypted) cookie carrying the user id.
//! `CurrentUser` re-reads the user row on every request, so role changes
//! and deleted accounts take effect immediately. Auth state is explicit
//! per-request context; there is no process-wide session table.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use time::Duration;

use crate::db::models::User;
use crate::error::AppError;
use crate::router::AppState;

pub const SESSION_COOKIE: &str = "spendlog_session";
const SESSION_MAX_AGE: Duration = Duration::days(7);

/// The authenticated user for this request.
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar: PrivateCookieJar = match PrivateCookieJar::from_request_parts(parts, state).await {
            Ok(jar) => jar,
            Err(never) => match never {},
        };
        let cookie = jar.get(SESSION_COOKIE).ok_or(AppError::Unauthorized)?;
        let user_id: i64 = cookie.value().parse().map_err(|_| AppError::Unauthorized)?;
        let user = state
            .store
            .get_user_by_id(user_id)
            .await?
            .ok_or(AppError::Unauthorized)?;
        Ok(CurrentUser(user))
    }
}

/// Like `CurrentUser`, but rejects non-admins with 403.
pub struct RequireAdmin(pub User);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(AppError::Forbidden);
        }
        Ok(RequireAdmin(user))
    }
}

pub fn session_cookie(user_id: i64) -> Cookie<'static> {
    Cookie::build(Cookie::new(SESSION_COOKIE.to_string(), user_id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(SESSION_MAX_AGE)
        .build()
}

pub fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build(Cookie::new(SESSION_COOKIE.to_string(), String::new()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}
