use crate::app_error::AppResult;

/// Authenticates inbound billing-provider webhooks.
pub trait WebhookVerifier: Send + Sync {
    /// Check `signature_header` against the exact raw request body.
    /// Any failure is `AppError::InvalidSignature`.
    fn verify(&self, raw_body: &str, signature_header: &str) -> AppResult<()>;
}
