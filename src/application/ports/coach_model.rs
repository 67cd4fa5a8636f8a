use async_trait::async_trait;

use crate::{app_error::AppResult, domain::entities::coach_request::CoachPrompt};

/// Language model used by the AI coach.
#[async_trait]
pub trait CoachModel: Send + Sync {
    /// Generate a reply for the prompt. Returns an empty string when the
    /// model produced no content.
    async fn complete(&self, prompt: &CoachPrompt) -> AppResult<String>;
}
