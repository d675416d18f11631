//! Text completion client.
//!
//! One prompt in, one completion out. No retries: a failed call fails the
//! fly it was made for.

use async_trait::async_trait;
use log::warn;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("rate limited")]
    RateLimited,
    #[error("invalid api key")]
    InvalidApiKey,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("completion response had no choices")]
    Empty,
}

#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

#[derive(Debug, Clone)]
pub struct CompletionSettings {
    pub api_key: String,
    /// Chat completions URL, normally [`OPENAI_CHAT_URL`].
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

pub struct OpenAiClient {
    client: Client,
    settings: CompletionSettings,
}

impl OpenAiClient {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn new(settings: CompletionSettings) -> Result<Self, CompletionError> {
        let client = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("hooked-on-flies/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, settings })
    }
}

#[async_trait]
impl CompletionService for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let request = ChatRequest {
            model: &self.settings.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        let response = self
            .client
            .post(&self.settings.endpoint)
            .bearer_auth(&self.settings.api_key)
            .json(&request)
            .send()
            .await?;

        match response.status() {
            s if s.is_success() => {
                let body: ChatResponse = response.json().await?;
                body.choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.message.content)
                    .map(|content| content.trim().to_string())
                    .ok_or(CompletionError::Empty)
            }
            StatusCode::UNAUTHORIZED => Err(CompletionError::InvalidApiKey),
            StatusCode::TOO_MANY_REQUESTS => {
                warn!("Completion service rate limited the request");
                Err(CompletionError::RateLimited)
            }
            s => {
                let status = s.as_u16();
                let body = response.text().await.unwrap_or_default();
                Err(CompletionError::Http { status, body })
            }
        }
    }
}
