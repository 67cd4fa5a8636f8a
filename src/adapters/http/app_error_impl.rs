use crate::app_error::{AppError, ErrorCode};
use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error before it gets converted into a status response.
        if self.is_retryable() {
            tracing::error!(error = ?self, "Request failed");
        } else {
            tracing::warn!(error = %self, "Request rejected");
        }

        match self {
            AppError::Database(_) => error_resp(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::DatabaseError,
                "Internal server error",
            ),
            AppError::InvalidCredentials => error_resp(
                StatusCode::UNAUTHORIZED,
                ErrorCode::InvalidCredentials,
                "Unauthorized",
            ),
            AppError::InvalidSignature(_) => error_resp(
                StatusCode::BAD_REQUEST,
                ErrorCode::InvalidSignature,
                "Invalid signature",
            ),
            AppError::InvalidInput(msg) => {
                error_resp(StatusCode::BAD_REQUEST, ErrorCode::InvalidInput, &msg)
            }
            AppError::NotFound => error_resp(StatusCode::NOT_FOUND, ErrorCode::NotFound, "Not found"),
            AppError::QuotaExceeded { limit, current } => {
                let body = serde_json::json!({
                    "code": ErrorCode::QuotaExceeded.as_str(),
                    "error": "AI request limit reached for this month",
                    "limit": limit,
                    "current": current,
                });
                (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response()
            }
            AppError::Internal(_) => error_resp(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::InternalError,
                "Internal server error",
            ),
        }
    }
}

fn error_resp(status: StatusCode, code: ErrorCode, message: &str) -> Response {
    let body = serde_json::json!({ "code": code.as_str(), "error": message });
    (status, Json(body)).into_response()
}
