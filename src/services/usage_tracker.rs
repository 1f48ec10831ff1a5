//! Usage tracking orchestrator.
//!
//! Owns the in-memory mirror of the stats and history documents and pushes
//! every mutation through the store synchronously. Writers (`record_chat`,
//! `reset_stats`) serialize on the write lock, persistence included; reads
//! take the read lock and return owned snapshots. The remote model call
//! happens entirely outside this module.
//!
//! All calendar logic uses UTC dates.

use crate::models::usage::{ChatHistoryItem, UsageStats};
use crate::services::anomaly_detector;
use crate::services::usage_store::{LoadOutcome, UsageStore};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

const MAX_HISTORY_ENTRIES: usize = 100;
const ANOMALY_PREVIEW_CHARS: usize = 100;

struct TrackerState {
    stats: UsageStats,
    history: Vec<ChatHistoryItem>,
}

pub struct UsageTracker {
    store: UsageStore,
    state: RwLock<TrackerState>,
}

impl UsageTracker {
    /// Load both documents once and hold them in memory from then on.
    /// Missing or unreadable documents degrade to empty defaults.
    pub fn load(store: UsageStore) -> Self {
        let stats = match store.load_stats() {
            LoadOutcome::Loaded(stats) => stats,
            LoadOutcome::Missing => {
                info!("No usage stats document yet, starting from zero");
                UsageStats::default()
            }
            LoadOutcome::Invalid { reason } => {
                warn!("Usage stats document unreadable ({}), starting from zero", reason);
                UsageStats::default()
            }
        };

        let history = match store.load_history() {
            LoadOutcome::Loaded(history) => history,
            LoadOutcome::Missing => {
                info!("No chat history document yet, starting empty");
                Vec::new()
            }
            LoadOutcome::Invalid { reason } => {
                warn!("Chat history document unreadable ({}), starting empty", reason);
                Vec::new()
            }
        };

        Self {
            store,
            state: RwLock::new(TrackerState { stats, history }),
        }
    }

    /// Record one completed exchange: lazy daily reset, anomaly check,
    /// counter updates, capped history append, then persistence of both
    /// documents. Persistence failures are logged and never surface; the
    /// in-memory state stays advanced either way.
    pub async fn record_chat(
        &self,
        user_message: &str,
        assistant_message: &str,
        tokens_input: u32,
        tokens_output: u32,
        cost: BigDecimal,
    ) {
        let now = Utc::now();
        let mut state = self.state.write().await;

        if needs_daily_reset(&state.stats, now) {
            reset_daily_counters(&mut state.stats);
        }

        // The burst window looks at the history before this exchange lands.
        if anomaly_detector::is_abnormal(tokens_input, tokens_output, &cost, &state.history, now) {
            let preview: String = user_message.chars().take(ANOMALY_PREVIEW_CHARS).collect();
            warn!(
                "Abnormal usage detected: tokens_input={}, tokens_output={}, cost=${}, user_message={:?}",
                tokens_input, tokens_output, cost, preview
            );
        }

        state.stats.total_requests += 1;
        state.stats.total_tokens_input += tokens_input as u64;
        state.stats.total_tokens_output += tokens_output as u64;
        state.stats.total_cost += cost.clone();

        state.stats.requests_today += 1;
        state.stats.tokens_today += tokens_input as u64 + tokens_output as u64;
        state.stats.cost_today += cost.clone();
        state.stats.last_request_time = Some(now);

        state.history.push(ChatHistoryItem {
            timestamp: now,
            user_message: user_message.to_string(),
            assistant_message: assistant_message.to_string(),
            tokens_used: tokens_input as u64 + tokens_output as u64,
            cost,
        });
        if state.history.len() > MAX_HISTORY_ENTRIES {
            let excess = state.history.len() - MAX_HISTORY_ENTRIES;
            state.history.drain(..excess);
        }

        if let Err(e) = self.store.save_stats(&state.stats) {
            error!("Failed to persist usage stats: {}", e);
        }
        if let Err(e) = self.store.save_history(&state.history) {
            error!("Failed to persist chat history: {}", e);
        }
    }

    /// Current stats snapshot, with the daily counters reset first if the
    /// UTC day rolled over since the last recorded exchange.
    pub async fn get_stats(&self) -> UsageStats {
        {
            let state = self.state.read().await;
            if !needs_daily_reset(&state.stats, Utc::now()) {
                return state.stats.clone();
            }
        }

        // Day rolled over between requests; re-check under the write lock.
        let mut state = self.state.write().await;
        if needs_daily_reset(&state.stats, Utc::now()) {
            reset_daily_counters(&mut state.stats);
        }
        state.stats.clone()
    }

    /// The most recent `limit` history entries in chronological order,
    /// oldest of the returned window first.
    pub async fn get_history(&self, limit: usize) -> Vec<ChatHistoryItem> {
        let state = self.state.read().await;
        let start = state.history.len().saturating_sub(limit);
        state.history[start..].to_vec()
    }

    /// Zero every counter and clear the last request time, persisting the
    /// stats document immediately. History is left untouched.
    pub async fn reset_stats(&self) {
        let mut state = self.state.write().await;
        state.stats = UsageStats::default();

        if let Err(e) = self.store.save_stats(&state.stats) {
            error!("Failed to persist usage stats after reset: {}", e);
        }
    }
}

fn needs_daily_reset(stats: &UsageStats, now: DateTime<Utc>) -> bool {
    match stats.last_request_time {
        Some(last) => last.date_naive() < now.date_naive(),
        None => true,
    }
}

fn reset_daily_counters(stats: &mut UsageStats) {
    stats.requests_today = 0;
    stats.tokens_today = 0;
    stats.cost_today = BigDecimal::default();
}
