use crate::services::usage_tracker::UsageTracker;
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;

const DEFAULT_HISTORY_LIMIT: i64 = 50;
const DEFAULT_DOCUMENT_HISTORY_LIMIT: i64 = 100;

#[derive(Deserialize)]
pub struct HistoryQuery {
    limit: Option<i64>,
}

impl HistoryQuery {
    fn limit_or(&self, default: i64) -> usize {
        self.limit.unwrap_or(default).max(0) as usize
    }
}

/// Current usage statistics (daily counters reset lazily on read).
pub async fn get_usage_stats(tracker: web::Data<UsageTracker>) -> impl Responder {
    HttpResponse::Ok().json(tracker.get_stats().await)
}

/// Most recent chat history entries, oldest first.
pub async fn get_usage_history(
    query: web::Query<HistoryQuery>,
    tracker: web::Data<UsageTracker>,
) -> impl Responder {
    let history = tracker.get_history(query.limit_or(DEFAULT_HISTORY_LIMIT)).await;
    HttpResponse::Ok().json(history)
}

/// Zero the usage counters (development utility).
pub async fn reset_usage_stats(tracker: web::Data<UsageTracker>) -> impl Responder {
    tracker.reset_stats().await;
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Usage stats reset successfully"
    }))
}

// Aliases consumed by the static frontend.

pub async fn get_stats_document(tracker: web::Data<UsageTracker>) -> impl Responder {
    HttpResponse::Ok().json(tracker.get_stats().await)
}

pub async fn get_history_document(
    query: web::Query<HistoryQuery>,
    tracker: web::Data<UsageTracker>,
) -> impl Responder {
    let history = tracker
        .get_history(query.limit_or(DEFAULT_DOCUMENT_HISTORY_LIMIT))
        .await;
    HttpResponse::Ok().json(history)
}
