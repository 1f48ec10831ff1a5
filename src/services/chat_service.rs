//! Chat gateway: drives one exchange against the Gemini API and hands the
//! resulting usage triple to the tracker.
//!
//! The tracker is only touched after the remote call resolves, so slow
//! upstream requests never hold its lock.

use crate::clients::gemini_client::GeminiClient;
use crate::models::chat::{ChatMessage, ChatResponse};
use crate::services::cost_estimator;
use crate::services::usage_tracker::UsageTracker;
use crate::utils::token_estimator::{estimate_tokens, estimate_tokens_for_contents};
use bigdecimal::BigDecimal;
use std::sync::Arc;
use tracing::{debug, error};

const PROVIDER: &str = "gemini";

const EMPTY_REPLY_FALLBACK: &str = "The model did not produce a reply. Please try asking again.";
const SAFETY_NOTICE: &str = "The reply was blocked by the safety policy.";
const RECITATION_NOTICE: &str = "The reply was withheld because recited content was detected.";
const TRUNCATION_NOTICE: &str = "\n\nNote: the reply may have been cut short by the output token limit.";
const UPSTREAM_ERROR_NOTICE: &str = "\n\nNote: the model reported an error while finishing this reply.";

// Below this many output tokens a MAX_TOKENS finish is treated as a
// complete short reply and the truncation notice is skipped.
const TRUNCATION_NOTICE_MIN_TOKENS: u32 = 50;

pub struct ChatService {
    client: GeminiClient,
    tracker: Arc<UsageTracker>,
}

impl ChatService {
    pub fn new(client: GeminiClient, tracker: Arc<UsageTracker>) -> Self {
        Self { client, tracker }
    }

    /// Run one exchange. System messages are dropped from the forwarded
    /// conversation. Every resolved exchange is recorded exactly once,
    /// fallback replies included; transport failures produce an apology
    /// response without touching the tracker.
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: Option<u32>,
    ) -> ChatResponse {
        let conversation: Vec<ChatMessage> = messages
            .iter()
            .filter(|message| message.role != "system")
            .cloned()
            .collect();

        let request = self.client.build_chat_request(&conversation, temperature, max_tokens);

        let response = match self.client.chat_completion(&request).await {
            Ok(response) => response,
            Err(e) => {
                error!("Gemini call failed: {}", e);
                return ChatResponse {
                    content: format!("Sorry, the AI service returned an error. ({})", e),
                    model: self.client.model().to_string(),
                    provider: PROVIDER.to_string(),
                    tokens_input: 0,
                    tokens_output: 0,
                    cost: BigDecimal::default(),
                };
            }
        };

        let mut content = response.primary_text().trim().to_string();

        let (tokens_input, mut tokens_output) = match response.token_counts() {
            Some(counts) => counts,
            None => {
                debug!("Gemini response carried no usage metadata, estimating token counts");
                let input_texts: Vec<&str> = conversation
                    .iter()
                    .map(|message| message.content.as_str())
                    .collect();
                (estimate_tokens_for_contents(&input_texts), estimate_tokens(&content))
            }
        };

        match response.finish_reason() {
            Some("MAX_TOKENS") if tokens_output >= TRUNCATION_NOTICE_MIN_TOKENS => {
                content.push_str(TRUNCATION_NOTICE);
            }
            Some("MAX_TOKENS") => {
                debug!("MAX_TOKENS finish with a short reply, skipping the truncation notice");
            }
            Some("SAFETY") => content = SAFETY_NOTICE.to_string(),
            Some("RECITATION") => content = RECITATION_NOTICE.to_string(),
            Some("OTHER") => content.push_str(UPSTREAM_ERROR_NOTICE),
            _ => {}
        }

        if content.is_empty() {
            content = EMPTY_REPLY_FALLBACK.to_string();
            tokens_output = 0;
        }

        let cost = cost_estimator::estimate_cost(tokens_input, tokens_output);

        let user_message = conversation
            .last()
            .map(|message| message.content.clone())
            .unwrap_or_default();
        self.tracker
            .record_chat(&user_message, &content, tokens_input, tokens_output, cost.clone())
            .await;

        ChatResponse {
            content,
            model: self.client.model().to_string(),
            provider: PROVIDER.to_string(),
            tokens_input,
            tokens_output,
            cost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::{
        AppConfig, AppSettings, GeminiConfig, GuardrailConfig, ServerConfig, StaticFilesConfig,
        UsageConfig,
    };
    use crate::services::usage_store::UsageStore;
    use bigdecimal::Zero;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;
    use tempfile::TempDir;

    fn test_settings(base_url: String) -> AppSettings {
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
                base_url: Some(base_url),
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

    fn service_in(dir: &TempDir, base_url: String) -> (ChatService, Arc<UsageTracker>) {
        let tracker = Arc::new(UsageTracker::load(UsageStore::new(dir.path()).unwrap()));
        let client = GeminiClient::new(&test_settings(base_url)).unwrap();
        (ChatService::new(client, tracker.clone()), tracker)
    }

    fn body(text: &str, finish_reason: &str, input: u32, output: u32) -> String {
        format!(
            r#"{{
                "candidates": [{{
                    "content": {{"parts": [{{"text": "{text}"}}], "role": "model"}},
                    "finishReason": "{finish_reason}",
                    "index": 0
                }}],
                "usageMetadata": {{
                    "promptTokenCount": {input},
                    "candidatesTokenCount": {output},
                    "totalTokenCount": {total}
                }}
            }}"#,
            total = input + output
        )
    }

    #[tokio::test]
    async fn successful_exchange_is_recorded() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .with_status(200)
            .with_body(body("hello", "STOP", 5, 3))
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let (service, tracker) = service_in(&dir, server.url());

        let response = service.chat(&[ChatMessage::user("hi")], 0.7, None).await;

        assert_eq!(response.content, "hello");
        assert_eq!(response.tokens_input, 5);
        assert_eq!(response.tokens_output, 3);
        assert_eq!(response.cost, BigDecimal::from_str("0.000001").unwrap());

        let stats = tracker.get_stats().await;
        assert_eq!(stats.total_requests, 1);
        assert_eq!(stats.total_tokens_input, 5);
        let history = tracker.get_history(10).await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].user_message, "hi");
        assert_eq!(history[0].assistant_message, "hello");
    }

    #[tokio::test]
    async fn safety_block_replaces_the_reply_and_is_still_recorded() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .with_status(200)
            .with_body(body("partial", "SAFETY", 5, 2))
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let (service, tracker) = service_in(&dir, server.url());

        let response = service.chat(&[ChatMessage::user("hi")], 0.7, None).await;

        assert_eq!(response.content, SAFETY_NOTICE);
        assert_eq!(tracker.get_stats().await.total_requests, 1);
        assert_eq!(
            tracker.get_history(10).await[0].assistant_message,
            SAFETY_NOTICE
        );
    }

    #[tokio::test]
    async fn empty_reply_falls_back_with_zero_output_tokens() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .with_status(200)
            .with_body(r#"{"candidates": [], "usageMetadata": {"promptTokenCount": 5, "candidatesTokenCount": 0, "totalTokenCount": 5}}"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let (service, tracker) = service_in(&dir, server.url());

        let response = service.chat(&[ChatMessage::user("hi")], 0.7, None).await;

        assert_eq!(response.content, EMPTY_REPLY_FALLBACK);
        assert_eq!(response.tokens_output, 0);
        // The fallback reply still counts as a completed exchange.
        assert_eq!(tracker.get_stats().await.total_requests, 1);
    }

    #[tokio::test]
    async fn transport_errors_are_not_recorded() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .with_status(500)
            .with_body("upstream exploded")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let (service, tracker) = service_in(&dir, server.url());

        let response = service.chat(&[ChatMessage::user("hi")], 0.7, None).await;

        assert!(response.content.starts_with("Sorry, the AI service returned an error."));
        assert_eq!(response.tokens_input, 0);
        assert_eq!(response.cost, BigDecimal::zero());
        assert_eq!(tracker.get_stats().await.total_requests, 0);
        assert!(tracker.get_history(10).await.is_empty());
    }

    #[tokio::test]
    async fn long_truncated_replies_get_a_notice() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .with_status(200)
            .with_body(body("a long reply", "MAX_TOKENS", 5, 80))
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let (service, _tracker) = service_in(&dir, server.url());

        let response = service.chat(&[ChatMessage::user("hi")], 0.7, None).await;

        assert!(response.content.starts_with("a long reply"));
        assert!(response.content.ends_with(TRUNCATION_NOTICE));
    }

    #[tokio::test]
    async fn short_truncated_replies_skip_the_notice() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .with_status(200)
            .with_body(body("brief", "MAX_TOKENS", 5, 2))
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let (service, _tracker) = service_in(&dir, server.url());

        let response = service.chat(&[ChatMessage::user("hi")], 0.7, None).await;

        assert_eq!(response.content, "brief");
    }
}
