use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppSettings {
    pub app: AppConfig,
    pub server: ServerConfig,
    pub gemini: GeminiConfig,
    pub usage: UsageConfig,
    pub guardrail: GuardrailConfig,
    pub static_files: StaticFilesConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    pub name: String,
    pub environment: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UsageConfig {
    pub data_dir: PathBuf,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GuardrailConfig {
    pub wordlist_path: PathBuf,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StaticFilesConfig {
    pub dir: PathBuf,
}

impl AppSettings {
    pub fn from_env() -> Result<Self, AppError> {
        // App config
        let app_name = env::var("APP_NAME").unwrap_or_else(|_| "promptbridge".to_string());
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        // Server config
        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .map_err(|_| AppError::Configuration("SERVER_PORT must be a valid port number".to_string()))?;

        // CORS origins
        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        // Gemini API
        let gemini_api_key = env::var("GEMINI_API_KEY")
            .map_err(|_| AppError::Configuration("GEMINI_API_KEY must be set".to_string()))?;

        let gemini_model = env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".to_string());

        let gemini_base_url = env::var("GEMINI_BASE_URL").ok();

        // Usage tracking storage
        let usage_data_dir = env::var("USAGE_DATA_DIR").unwrap_or_else(|_| "data".to_string());

        // Profanity guard word list
        let guard_wordlist_path = env::var("GUARD_WORDLIST_PATH").unwrap_or_else(|_| "guard.csv".to_string());

        // Static frontend assets
        let static_dir = env::var("STATIC_DIR").unwrap_or_else(|_| "static".to_string());

        Ok(Self {
            app: AppConfig {
                name: app_name,
                environment,
            },
            server: ServerConfig {
                host: server_host,
                port: server_port,
                cors_origins,
            },
            gemini: GeminiConfig {
                api_key: gemini_api_key,
                model: gemini_model,
                base_url: gemini_base_url,
            },
            usage: UsageConfig {
                data_dir: PathBuf::from(usage_data_dir),
            },
            guardrail: GuardrailConfig {
                wordlist_path: PathBuf::from(guard_wordlist_path),
            },
            static_files: StaticFilesConfig {
                dir: PathBuf::from(static_dir),
            },
        })
    }
}
