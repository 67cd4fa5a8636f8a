use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::post,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    adapters::http::{app_state::AppState, auth::current_user_id},
    app_error::{AppError, AppResult},
    domain::entities::coach_request::{
        CoachRequest, CoachRequestType, CoachTask, SessionReflection,
    },
};

pub fn router() -> Router<AppState> {
    Router::new().route("/coach", post(coach))
}

#[derive(Deserialize)]
struct CoachPayload {
    #[serde(rename = "type")]
    request_type: String,
    #[serde(default)]
    task: Option<CoachTask>,
    #[serde(default)]
    history: Value,
    /// Reflection fields arrive at the top level of the body.
    #[serde(flatten)]
    reflection: SessionReflection,
}

async fn coach(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(payload): Json<CoachPayload>,
) -> AppResult<impl IntoResponse> {
    let user_id = current_user_id(&headers, &jar, &app_state)?;

    let request_type = CoachRequestType::parse(&payload.request_type)
        .ok_or_else(|| AppError::InvalidInput("Invalid request type".into()))?;

    let reply = app_state
        .coach_use_cases
        .coach(
            user_id,
            CoachRequest {
                request_type,
                task: payload.task,
                history: payload.history,
                reflection: payload.reflection,
            },
        )
        .await?;

    Ok(Json(reply))
}
