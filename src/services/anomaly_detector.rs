/// Flags exchanges that look abnormal: oversized requests or replies,
/// expensive single calls, or request bursts. Observability only; callers
/// log a warning and carry on.
use crate::models::usage::ChatHistoryItem;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use std::str::FromStr;

const MAX_TOKENS_INPUT: u32 = 10_000;
const MAX_TOKENS_OUTPUT: u32 = 20_000;
const BURST_WINDOW_SECONDS: i64 = 60;
const BURST_MAX_REQUESTS: usize = 10;

static MAX_COST_USD: Lazy<BigDecimal> =
    Lazy::new(|| BigDecimal::from_str("1.00").expect("cost threshold is a valid decimal"));

/// True when any threshold is exceeded. Thresholds are exclusive-above:
/// hitting a limit exactly is still normal. The burst check counts the
/// history as it stood before the current exchange is appended.
pub fn is_abnormal(
    tokens_input: u32,
    tokens_output: u32,
    cost: &BigDecimal,
    history: &[ChatHistoryItem],
    now: DateTime<Utc>,
) -> bool {
    if tokens_input > MAX_TOKENS_INPUT {
        return true;
    }

    if tokens_output > MAX_TOKENS_OUTPUT {
        return true;
    }

    if *cost > *MAX_COST_USD {
        return true;
    }

    let window_start = now - Duration::seconds(BURST_WINDOW_SECONDS);
    let recent_requests = history
        .iter()
        .filter(|item| item.timestamp > window_start)
        .count();

    recent_requests > BURST_MAX_REQUESTS
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::Zero;

    fn history_entry(timestamp: DateTime<Utc>) -> ChatHistoryItem {
        ChatHistoryItem {
            timestamp,
            user_message: "hi".to_string(),
            assistant_message: "hello".to_string(),
            tokens_used: 8,
            cost: BigDecimal::zero(),
        }
    }

    fn zero_cost() -> BigDecimal {
        BigDecimal::zero()
    }

    #[test]
    fn input_token_boundary_is_exclusive() {
        let now = Utc::now();
        assert!(!is_abnormal(10_000, 0, &zero_cost(), &[], now));
        assert!(is_abnormal(10_001, 0, &zero_cost(), &[], now));
    }

    #[test]
    fn output_token_boundary_is_exclusive() {
        let now = Utc::now();
        assert!(!is_abnormal(0, 20_000, &zero_cost(), &[], now));
        assert!(is_abnormal(0, 20_001, &zero_cost(), &[], now));
    }

    #[test]
    fn cost_boundary_is_exclusive() {
        let now = Utc::now();
        let at_limit = BigDecimal::from_str("1.00").unwrap();
        let over_limit = BigDecimal::from_str("1.01").unwrap();

        assert!(!is_abnormal(0, 0, &at_limit, &[], now));
        assert!(is_abnormal(0, 0, &over_limit, &[], now));
    }

    #[test]
    fn burst_of_eleven_recent_requests_is_abnormal() {
        let now = Utc::now();
        let history: Vec<_> = (0..11)
            .map(|i| history_entry(now - Duration::seconds(i + 1)))
            .collect();

        assert!(is_abnormal(5, 3, &zero_cost(), &history, now));
    }

    #[test]
    fn ten_recent_requests_stay_normal() {
        let now = Utc::now();
        let history: Vec<_> = (0..10)
            .map(|i| history_entry(now - Duration::seconds(i + 1)))
            .collect();

        assert!(!is_abnormal(5, 3, &zero_cost(), &history, now));
    }

    #[test]
    fn old_requests_fall_out_of_the_burst_window() {
        let now = Utc::now();
        let history: Vec<_> = (0..20)
            .map(|i| history_entry(now - Duration::seconds(120 + i)))
            .collect();

        assert!(!is_abnormal(5, 3, &zero_cost(), &history, now));
    }
}
