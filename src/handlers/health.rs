use crate::config::AppSettings;
use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    status: String,
    version: String,
    provider: String,
    model: String,
    environment: String,
    has_api_key: bool,
    api_key_length: usize,
    api_key_preview: String,
}

pub async fn health_check(settings: web::Data<AppSettings>) -> impl Responder {
    let api_key = &settings.gemini.api_key;
    let api_key_preview = if api_key.len() >= 4 {
        api_key[api_key.len() - 4..].to_string()
    } else {
        "none".to_string()
    };

    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        provider: "gemini".to_string(),
        model: settings.gemini.model.clone(),
        environment: settings.app.environment.clone(),
        has_api_key: !api_key.is_empty(),
        api_key_length: api_key.len(),
        api_key_preview,
    };

    HttpResponse::Ok().json(response)
}
