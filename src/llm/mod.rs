// file: src/llm/mod.rs
// description: chat model abstraction used for synthesis and evaluation
// reference: https://platform.openai.com/docs/api-reference/chat

pub mod openai;
pub mod prompts;

pub use openai::OpenAiChatClient;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model_name(&self) -> &str;

    async fn chat(&self, messages: &[ChatMessage]) -> Result<String>;

    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        self.chat(&[ChatMessage::system(system), ChatMessage::user(prompt)])
            .await
    }
}
