use crate::error::{AppError, AppResult};
use crate::models::chat::{default_temperature, ChatMessage, ChatRequest};
use crate::services::chat_service::ChatService;
use crate::services::guardrail::Guardrail;
use crate::utils::prompt_builder::build_prompt;
use actix_web::{web, HttpResponse};
use serde::Deserialize;

/// Forward one conversation to the model and return the reply with its
/// usage triple. Tracker failures never surface here; the service records
/// usage best-effort.
pub async fn chat(
    request: web::Json<ChatRequest>,
    chat_service: web::Data<ChatService>,
) -> AppResult<HttpResponse> {
    request.validate()?;

    let response = chat_service
        .chat(&request.messages, request.temperature, request.max_tokens)
        .await;

    Ok(HttpResponse::Ok().json(response))
}

#[derive(Debug, Deserialize)]
pub struct RagTestForm {
    pub metadata: String,
    pub chat_log: String,
    pub rag_criteria: String,
    pub user_input: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_rag_max_tokens")]
    pub max_tokens: u32,
}

fn default_rag_max_tokens() -> u32 {
    1000
}

/// Tutoring endpoint: guard the user input, assemble the templated prompt
/// and run it as a single-turn exchange.
pub async fn rag_prompt_test(
    form: web::Form<RagTestForm>,
    guardrail: web::Data<Guardrail>,
    chat_service: web::Data<ChatService>,
) -> AppResult<HttpResponse> {
    if guardrail.contains_profanity(&form.user_input) {
        return Err(AppError::BadRequest(
            "The input contains a banned word".to_string(),
        ));
    }

    let prompt = build_prompt(&form.metadata, &form.chat_log, &form.rag_criteria, &form.user_input);

    let response = chat_service
        .chat(
            &[ChatMessage::user(prompt.clone())],
            form.temperature,
            Some(form.max_tokens),
        )
        .await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "prompt": prompt,
        "response": response.content,
        "tokens_input": response.tokens_input,
        "tokens_output": response.tokens_output,
        "cost": response.cost,
    })))
}
