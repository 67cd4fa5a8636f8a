use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::get,
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    adapters::http::{app_state::AppState, auth::current_user_id},
    app_error::AppResult,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

async fn get_me(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> AppResult<impl IntoResponse> {
    let user_id = current_user_id(&headers, &jar, &app_state)?;

    let profile = app_state.account_use_cases.get_profile(user_id).await?;

    Ok(Json(profile))
}
