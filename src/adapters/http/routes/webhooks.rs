use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::post,
};
use serde_json::json;

use crate::{adapters::http::app_state::AppState, app_error::AppResult};

pub fn router() -> Router<AppState> {
    Router::new().route("/stripe", post(stripe_webhook))
}

/// The body is taken as raw text: the signature covers the exact bytes sent.
async fn stripe_webhook(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> AppResult<impl IntoResponse> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok());

    app_state.reconciler.handle_webhook(&body, signature).await?;

    Ok(Json(json!({ "received": true })))
}
