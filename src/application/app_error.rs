use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid webhook signature: {0}")]
    InvalidSignature(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found")]
    NotFound,

    #[error("AI request limit reached ({current}/{limit})")]
    QuotaExceeded { limit: i32, current: i32 },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Transient failures the caller may retry (the billing provider redelivers on 5xx).
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Database(_) | AppError::Internal(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    DatabaseError,
    InvalidCredentials,
    InvalidSignature,
    InvalidInput,
    NotFound,
    QuotaExceeded,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorCode::InvalidSignature => "INVALID_SIGNATURE",
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::QuotaExceeded => "QUOTA_EXCEEDED",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
