use crate::handlers::{chat_handlers, usage_handlers};
use actix_web::web;

// Configure API routes. Health, favicon and the static frontend are
// registered directly on the App in main.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    // Chat routes
    cfg.route("/chat", web::post().to(chat_handlers::chat));
    cfg.route("/rag-test", web::post().to(chat_handlers::rag_prompt_test));

    // Usage routes (/usage/*)
    cfg.service(
        web::scope("/usage")
            .route("/stats", web::get().to(usage_handlers::get_usage_stats))
            .route("/history", web::get().to(usage_handlers::get_usage_history))
            .route("/reset", web::get().to(usage_handlers::reset_usage_stats)),
    );

    // Document aliases for the static frontend (/api/*)
    cfg.service(
        web::scope("/api")
            .route("/stats", web::get().to(usage_handlers::get_stats_document))
            .route("/history", web::get().to(usage_handlers::get_history_document)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::usage_store::UsageStore;
    use crate::services::usage_tracker::UsageTracker;
    use actix_web::{test, App};
    use bigdecimal::BigDecimal;
    use std::sync::Arc;

    #[actix_web::test]
    async fn usage_routes_are_wired_up() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = Arc::new(UsageTracker::load(UsageStore::new(dir.path()).unwrap()));
        tracker.record_chat("hi", "hello", 1, 1, BigDecimal::from(0)).await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::from(tracker))
                .configure(configure_routes),
        )
        .await;

        for uri in ["/usage/stats", "/usage/history", "/api/stats", "/api/history"] {
            let request = test::TestRequest::get().uri(uri).to_request();
            let response = test::call_service(&app, request).await;
            assert!(response.status().is_success(), "GET {} failed", uri);
        }
    }
}
