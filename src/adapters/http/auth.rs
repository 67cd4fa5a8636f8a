use axum::http::{HeaderMap, header::AUTHORIZATION};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    application::jwt,
};

/// Cookie set by the identity provider's web client.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Resolve the calling user from `Authorization: Bearer <jwt>`, falling back
/// to the access-token cookie.
pub fn current_user_id(
    headers: &HeaderMap,
    jar: &CookieJar,
    app_state: &AppState,
) -> AppResult<Uuid> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let token = match bearer {
        Some(token) => token.to_string(),
        None => jar
            .get(ACCESS_TOKEN_COOKIE)
            .map(|c| c.value().to_string())
            .ok_or(AppError::InvalidCredentials)?,
    };

    jwt::user_id_from_token(&token, &app_state.config.jwt_secret)
}
