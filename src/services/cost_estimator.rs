/// Token-count to cost mapping for the configured model.
///
/// Rates are USD per 1K tokens (Gemini Flash pricing). Results are rounded
/// half-up to 6 decimal places so repeated accumulation stays deterministic.
use bigdecimal::{BigDecimal, RoundingMode};
use once_cell::sync::Lazy;
use std::str::FromStr;

static RATE_INPUT_PER_1K: Lazy<BigDecimal> =
    Lazy::new(|| BigDecimal::from_str("0.000075").expect("input rate is a valid decimal"));
static RATE_OUTPUT_PER_1K: Lazy<BigDecimal> =
    Lazy::new(|| BigDecimal::from_str("0.0003").expect("output rate is a valid decimal"));

const COST_SCALE: i64 = 6;

pub fn estimate_cost(tokens_input: u32, tokens_output: u32) -> BigDecimal {
    let input_cost = BigDecimal::from(tokens_input) * &*RATE_INPUT_PER_1K / BigDecimal::from(1000);
    let output_cost = BigDecimal::from(tokens_output) * &*RATE_OUTPUT_PER_1K / BigDecimal::from(1000);

    (input_cost + output_cost).with_scale_round(COST_SCALE, RoundingMode::HalfUp)
}
