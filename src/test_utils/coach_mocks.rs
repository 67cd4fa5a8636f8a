use async_trait::async_trait;
use std::sync::Mutex;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::coach_model::CoachModel,
    domain::entities::coach_request::CoachPrompt,
};

/// Coach model returning a canned reply, or failing on demand.
pub struct ScriptedCoachModel {
    reply: Option<String>,
    prompts: Mutex<Vec<CoachPrompt>>,
}

impl ScriptedCoachModel {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn last_prompt(&self) -> Option<CoachPrompt> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CoachModel for ScriptedCoachModel {
    async fn complete(&self, prompt: &CoachPrompt) -> AppResult<String> {
        self.prompts.lock().unwrap().push(prompt.clone());
        self.reply
            .clone()
            .ok_or_else(|| AppError::Internal("OpenAI API error: 503".into()))
    }
}
