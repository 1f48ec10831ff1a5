use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::net::TcpListener;
use std::sync::Arc;

mod clients;
mod config;
mod error;
mod handlers;
mod models;
mod routes;
mod services;
mod utils;

use crate::clients::gemini_client::GeminiClient;
use crate::config::AppSettings;
use crate::routes::configure_routes;
use crate::services::chat_service::ChatService;
use crate::services::guardrail::Guardrail;
use crate::services::usage_store::UsageStore;
use crate::services::usage_tracker::UsageTracker;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Load application settings
    let app_settings = match AppSettings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("Failed to load application settings: {}", e);
            log::error!("Cannot start server without valid settings");
            std::process::exit(1);
        }
    };

    // Usage tracking storage: a single tracker instance shared by every worker
    let usage_store = match UsageStore::new(app_settings.usage.data_dir.clone()) {
        Ok(store) => {
            log::info!(
                "Usage store ready at {}",
                app_settings.usage.data_dir.display()
            );
            store
        }
        Err(e) => {
            log::error!("Failed to initialize usage store: {}", e);
            log::error!("Cannot start server without a writable data directory");
            std::process::exit(1);
        }
    };
    let usage_tracker = web::Data::from(Arc::new(UsageTracker::load(usage_store)));

    // Gemini client and the chat gateway on top of it
    let gemini_client = match GeminiClient::new(&app_settings) {
        Ok(client) => {
            log::info!("Gemini client initialized for model {}", app_settings.gemini.model);
            client
        }
        Err(e) => {
            log::error!("Failed to initialize Gemini client: {}", e);
            log::error!("Cannot start server without a working Gemini client");
            std::process::exit(1);
        }
    };
    let chat_service = web::Data::new(ChatService::new(
        gemini_client,
        usage_tracker.clone().into_inner(),
    ));

    // Profanity guard (a missing word list disables it with a warning)
    let guardrail = web::Data::new(Guardrail::from_file(&app_settings.guardrail.wordlist_path));

    // Get server host and port from settings
    let host = &app_settings.server.host;
    let port = app_settings.server.port;

    log::info!("Starting server at http://{}:{}", host, port);

    let server_addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(server_addr)?;

    HttpServer::new(move || {
        // Clone the data for the factory closure
        let app_settings = app_settings.clone();
        let static_dir = app_settings.static_files.dir.clone();

        // Configure CORS using actix-cors
        let mut cors = Cors::default().supports_credentials();

        // Add allowed origins based on configuration
        if app_settings.server.cors_origins.contains(&"*".to_string()) {
            cors = cors.allow_any_origin();
        } else {
            for origin in &app_settings.server.cors_origins {
                cors = cors.allowed_origin(origin);
            }
        }

        // Common CORS settings for all origins
        cors = cors.allow_any_method().allow_any_header();

        // Create the App with common middleware and data
        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(web::Data::new(app_settings))
            .app_data(usage_tracker.clone())
            .app_data(chat_service.clone())
            .app_data(guardrail.clone())
            // Health check endpoint
            .service(
                web::resource("/health").route(web::get().to(handlers::health::health_check)),
            )
            // Frontend entry points
            .route("/", web::get().to(handlers::static_handlers::serve_index))
            .route(
                "/favicon.ico",
                web::get().to(handlers::static_handlers::favicon),
            )
            // API routes
            .configure(configure_routes)
            // Static assets (registered last so API routes win)
            .service(actix_files::Files::new("/static", static_dir))
    })
    .listen(listener)?
    .run()
    .await
}
