use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::coach_model::CoachModel,
    domain::entities::coach_request::CoachPrompt,
    infra::config::OpenAiConfig,
};
use secrecy::{ExposeSecret, SecretString};

/// Chat-completions client for OpenAI-compatible endpoints.
pub struct OpenAiClient {
    client: Client,
    api_key: SecretString,
    endpoint: Url,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiClient {
    pub fn new(client: Client, config: &OpenAiConfig) -> AppResult<Self> {
        // `join` replaces the last segment unless the base ends in a slash.
        let mut base = config.base_url.clone();
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        let endpoint = base
            .join("chat/completions")
            .map_err(|e| AppError::Internal(format!("Invalid OpenAI base URL: {}", e)))?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            endpoint,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    fn request_body<'a>(&'a self, prompt: &'a CoachPrompt) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

#[async_trait]
impl CoachModel for OpenAiClient {
    async fn complete(&self, prompt: &CoachPrompt) -> AppResult<String> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(self.api_key.expose_secret())
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("OpenAI request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "OpenAI API error");
            return Err(AppError::Internal(format!("OpenAI API error: {}", status)));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to parse OpenAI response: {}", e)))?;

        Ok(completion.into_text())
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl ChatResponse {
    fn into_text(self) -> String {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default()
    }
}
