use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregate usage counters, persisted as a single JSON document.
///
/// The `*_today` counters are a subset of the lifetime counters and are
/// zeroed lazily once the UTC calendar date of `last_request_time` falls
/// behind the current date. Costs are decimal to keep long accumulation
/// runs exact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    pub total_requests: u64,
    pub total_tokens_input: u64,
    pub total_tokens_output: u64,
    pub total_cost: BigDecimal,
    pub requests_today: u64,
    pub tokens_today: u64,
    pub cost_today: BigDecimal,
    pub last_request_time: Option<DateTime<Utc>>,
}

/// One completed exchange in the bounded transcript log.
///
/// Entries are immutable after creation; the log keeps only the most
/// recent entries (oldest dropped past the cap).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatHistoryItem {
    pub timestamp: DateTime<Utc>,
    pub user_message: String,
    pub assistant_message: String,
    pub tokens_used: u64,
    pub cost: BigDecimal,
}
