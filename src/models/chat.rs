use crate::error::AppError;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

/// One turn of a conversation as sent by the frontend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn is_valid_role(&self) -> bool {
        matches!(self.role.as_str(), "system" | "user" | "assistant")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

pub fn default_temperature() -> f32 {
    0.7
}

impl ChatRequest {
    /// Reject messages whose role is outside the supported set.
    pub fn validate(&self) -> Result<(), AppError> {
        for message in &self.messages {
            if !message.is_valid_role() {
                return Err(AppError::Validation(format!(
                    "Unsupported message role: {}",
                    message.role
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,
    pub model: String,
    pub provider: String,
    pub tokens_input: u32,
    pub tokens_output: u32,
    pub cost: BigDecimal,
}
