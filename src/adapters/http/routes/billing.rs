use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::post,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::{
    adapters::http::{app_state::AppState, auth::current_user_id},
    app_error::AppResult,
    domain::entities::{billing_interval::BillingInterval, subscription_tier::SubscriptionTier},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(create_checkout))
        .route("/portal", post(create_portal))
}

#[derive(Deserialize)]
struct CheckoutPayload {
    tier: SubscriptionTier,
    billing: BillingInterval,
}

async fn create_checkout(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(payload): Json<CheckoutPayload>,
) -> AppResult<impl IntoResponse> {
    let user_id = current_user_id(&headers, &jar, &app_state)?;

    let session = app_state
        .billing_use_cases
        .create_checkout(user_id, payload.tier, payload.billing)
        .await?;

    Ok(Json(session))
}

async fn create_portal(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> AppResult<impl IntoResponse> {
    let user_id = current_user_id(&headers, &jar, &app_state)?;

    let portal = app_state.billing_use_cases.create_portal(user_id).await?;

    Ok(Json(portal))
}
