// file: src/llm/openai.rs
// description: OpenAI-compatible chat completions client
// reference: https://platform.openai.com/docs/api-reference/chat

use super::{ChatMessage, ChatModel};
use crate::config::LlmConfig;
use crate::error::{RagError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, error};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Clone)]
pub struct OpenAiChatClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl fmt::Debug for OpenAiChatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiChatClient")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl OpenAiChatClient {
    pub fn new(
        api_key: String,
        base_url: String,
        model: String,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            temperature,
            max_tokens,
        }
    }

    /// Client for `model`, taking endpoint and sampling settings from `config`.
    pub fn from_config(config: &LlmConfig, model: &str) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            RagError::Config("an API key is required for the chat model".to_string())
        })?;

        Ok(Self::new(
            api_key,
            config.base_url.clone(),
            model.to_string(),
            config.temperature,
            config.max_tokens,
        ))
    }
}

fn extract_content(body: ChatResponse) -> Result<String> {
    body.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| RagError::Llm("chat completion returned no content".to_string()))
}

#[async_trait]
impl ChatModel for OpenAiChatClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!("Sending {} messages to {}", messages.len(), self.model);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| RagError::Llm(format!("Failed to send chat request: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| RagError::Llm(format!("Failed to read chat response: {}", e)))?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(RagError::Llm("chat model rate limited the request".to_string()));
        }

        if !status.is_success() {
            error!("Chat API error {}: {}", status, text);
            return Err(RagError::Llm(format!(
                "Chat request failed with status {}",
                status
            )));
        }

        let body: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| RagError::Llm(format!("Failed to parse chat response: {}", e)))?;

        extract_content(body)
    }
}
