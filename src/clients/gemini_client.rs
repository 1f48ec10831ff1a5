use crate::config::settings::AppSettings;
use crate::error::AppError;
use crate::models::chat::ChatMessage;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

// Base URL for the Google Gemini API
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

// Requested output tokens are capped upstream of the API call.
const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 512;
const MAX_OUTPUT_TOKENS_CEILING: u32 = 10_000;

// Gemini Chat Completion Request Structs
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GeminiChatRequest {
    pub contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<GeminiSystemInstruction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GeminiSystemInstruction {
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GeminiContent {
    pub role: String,
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GeminiPart {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

// Gemini Chat Completion Response Structs
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiChatResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
    pub usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiCandidate {
    pub content: Option<GeminiResponseContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GeminiResponseContent {
    pub parts: Option<Vec<GeminiPart>>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
#[serde(rename_all = "camelCase")]
pub struct GeminiUsageMetadata {
    pub prompt_token_count: u32,
    pub candidates_token_count: Option<u32>,
    pub total_token_count: u32,
}

impl GeminiChatResponse {
    /// Concatenated text of the first candidate, if any.
    pub fn primary_text(&self) -> String {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .and_then(|content| content.parts.as_ref())
            .map(|parts| {
                parts
                    .iter()
                    .map(|part| part.text.as_str())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    pub fn finish_reason(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|candidate| candidate.finish_reason.as_deref())
    }

    /// `(input, output)` token counts as reported by the API.
    pub fn token_counts(&self) -> Option<(u32, u32)> {
        self.usage_metadata
            .as_ref()
            .map(|usage| (usage.prompt_token_count, usage.candidates_token_count.unwrap_or(0)))
    }
}

// Gemini Client
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(app_settings: &AppSettings) -> Result<Self, AppError> {
        if app_settings.gemini.api_key.is_empty() {
            return Err(AppError::Configuration(
                "Gemini API key cannot be empty".to_string(),
            ));
        }

        let base_url = app_settings
            .gemini
            .base_url
            .clone()
            .unwrap_or_else(|| GEMINI_BASE_URL.to_string());

        Ok(Self {
            client: crate::utils::http_client::new_api_client(),
            api_key: app_settings.gemini.api_key.clone(),
            model: app_settings.gemini.model.clone(),
            base_url,
        })
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    // Convert frontend messages into a Gemini request.
    //
    // System messages fold into systemInstruction; the Gemini API uses
    // "user" and "model" conversation roles.
    pub fn build_chat_request(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: Option<u32>,
    ) -> GeminiChatRequest {
        let mut contents = Vec::new();
        let mut system_parts: Vec<GeminiPart> = Vec::new();

        for message in messages {
            let part = GeminiPart {
                text: message.content.clone(),
            };
            match message.role.as_str() {
                "system" => system_parts.push(part),
                "assistant" => contents.push(GeminiContent {
                    role: "model".to_string(),
                    parts: vec![part],
                }),
                _ => contents.push(GeminiContent {
                    role: "user".to_string(),
                    parts: vec![part],
                }),
            }
        }

        let max_output_tokens = max_tokens
            .unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS)
            .min(MAX_OUTPUT_TOKENS_CEILING);

        GeminiChatRequest {
            contents,
            system_instruction: if system_parts.is_empty() {
                None
            } else {
                Some(GeminiSystemInstruction { parts: system_parts })
            },
            generation_config: Some(GeminiGenerationConfig {
                temperature: Some(temperature),
                max_output_tokens: Some(max_output_tokens),
            }),
        }
    }

    // Chat Completions
    pub async fn chat_completion(
        &self,
        request: &GeminiChatRequest,
    ) -> Result<GeminiChatResponse, AppError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        debug!("Sending Gemini request for model {}", self.model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::External(format!("Gemini request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response".to_string());
            return Err(AppError::External(format!(
                "Gemini request failed with status {}: {}",
                status, error_text
            )));
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to get response text: {}", e)))?;

        let result = serde_json::from_str::<GeminiChatResponse>(&response_text).map_err(|e| {
            error!("Gemini deserialization failed: {} | Response: {}", e, response_text);
            AppError::Internal(format!("Gemini deserialization failed: {}", e))
        })?;

        info!(
            "Gemini request successful for model {} ({} candidates)",
            self.model,
            result.candidates.len()
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::{
        AppConfig, GeminiConfig, GuardrailConfig, ServerConfig, StaticFilesConfig, UsageConfig,
    };
    use pretty_assertions::assert_eq;

    fn test_settings(base_url: Option<String>) -> AppSettings {
        AppSettings {
            app: AppConfig {
                name: "promptbridge".to_string(),
                environment: "test".to_string(),
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
            },
            gemini: GeminiConfig {
                api_key: "test-key".to_string(),
                model: "gemini-2.5-flash".to_string(),
                base_url,
            },
            usage: UsageConfig {
                data_dir: "data".into(),
            },
            guardrail: GuardrailConfig {
                wordlist_path: "guard.csv".into(),
            },
            static_files: StaticFilesConfig { dir: "static".into() },
        }
    }

    #[test]
    fn rejects_empty_api_key() {
        let mut settings = test_settings(None);
        settings.gemini.api_key = String::new();

        assert!(GeminiClient::new(&settings).is_err());
    }

    #[test]
    fn build_request_folds_system_messages_and_maps_roles() {
        let client = GeminiClient::new(&test_settings(None)).unwrap();
        let messages = vec![
            ChatMessage {
                role: "system".to_string(),
                content: "be terse".to_string(),
            },
            ChatMessage::user("hi"),
            ChatMessage {
                role: "assistant".to_string(),
                content: "hello".to_string(),
            },
        ];

        let request = client.build_chat_request(&messages, 0.7, None);

        assert_eq!(request.contents.len(), 2);
        assert_eq!(request.contents[0].role, "user");
        assert_eq!(request.contents[1].role, "model");
        assert!(request.system_instruction.is_some());
        let config = request.generation_config.unwrap();
        assert_eq!(config.max_output_tokens, Some(DEFAULT_MAX_OUTPUT_TOKENS));
    }

    #[test]
    fn build_request_clamps_requested_output_tokens() {
        let client = GeminiClient::new(&test_settings(None)).unwrap();
        let messages = vec![ChatMessage::user("hi")];

        let request = client.build_chat_request(&messages, 0.7, Some(50_000));

        let config = request.generation_config.unwrap();
        assert_eq!(config.max_output_tokens, Some(MAX_OUTPUT_TOKENS_CEILING));
    }

    #[tokio::test]
    async fn chat_completion_parses_candidates_and_usage() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .match_header("x-goog-api-key", "test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "candidates": [{
                        "content": {"parts": [{"text": "hello"}], "role": "model"},
                        "finishReason": "STOP",
                        "index": 0
                    }],
                    "usageMetadata": {
                        "promptTokenCount": 5,
                        "candidatesTokenCount": 3,
                        "totalTokenCount": 8
                    }
                }"#,
            )
            .create_async()
            .await;

        let client = GeminiClient::new(&test_settings(Some(server.url()))).unwrap();
        let request = client.build_chat_request(&[ChatMessage::user("hi")], 0.7, None);
        let response = client.chat_completion(&request).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.primary_text(), "hello");
        assert_eq!(response.finish_reason(), Some("STOP"));
        assert_eq!(response.token_counts(), Some((5, 3)));
    }

    #[tokio::test]
    async fn chat_completion_surfaces_upstream_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .with_status(429)
            .with_body(r#"{"error": {"message": "quota exhausted"}}"#)
            .create_async()
            .await;

        let client = GeminiClient::new(&test_settings(Some(server.url()))).unwrap();
        let request = client.build_chat_request(&[ChatMessage::user("hi")], 0.7, None);
        let error = client.chat_completion(&request).await.unwrap_err();

        match error {
            AppError::External(message) => assert!(message.contains("429")),
            other => panic!("expected external error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn chat_completion_tolerates_missing_usage_metadata() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .with_status(200)
            .with_body(
                r#"{"candidates": [{"content": {"parts": [{"text": "ok"}], "role": "model"}}]}"#,
            )
            .create_async()
            .await;

        let client = GeminiClient::new(&test_settings(Some(server.url()))).unwrap();
        let request = client.build_chat_request(&[ChatMessage::user("hi")], 0.7, None);
        let response = client.chat_completion(&request).await.unwrap();

        assert_eq!(response.token_counts(), None);
        assert_eq!(response.primary_text(), "ok");
    }
}
