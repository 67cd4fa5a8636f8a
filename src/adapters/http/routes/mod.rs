pub mod ai;
pub mod billing;
pub mod user;
pub mod webhooks;

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

use crate::adapters::http::app_state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/webhooks", webhooks::router())
        .nest("/ai", ai::router())
        .nest("/billing", billing::router())
        .nest("/user", user::router())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
