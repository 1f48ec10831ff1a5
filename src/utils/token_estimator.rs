// Fallback token estimator for responses that arrive without usage metadata.
// The upstream API normally reports exact token counts; this keeps the
// usage accounting populated when it does not.

use log::debug;
use once_cell::sync::Lazy;
use tiktoken_rs::{cl100k_base, CoreBPE};

// Gemini does not publish a tokenizer; cl100k_base tracks its counts
// closely enough for accounting purposes.
static ENCODER: Lazy<Option<CoreBPE>> = Lazy::new(|| match cl100k_base() {
    Ok(bpe) => Some(bpe),
    Err(e) => {
        debug!("Failed to load cl100k_base encoder, falling back to character heuristic: {}", e);
        None
    }
});

/// Estimate the number of tokens in a text string.
///
/// Uses the cl100k_base encoding when available and a 4-characters-per-token
/// heuristic otherwise.
pub fn estimate_tokens(text: &str) -> u32 {
    if text.is_empty() {
        return 0;
    }

    match ENCODER.as_ref() {
        Some(encoder) => encoder.encode_with_special_tokens(text).len() as u32,
        None => {
            let char_count = text.chars().count() as u32;
            (char_count + 3) / 4
        }
    }
}

/// Estimate tokens for a whole prompt, one message content per slice entry.
pub fn estimate_tokens_for_contents(contents: &[&str]) -> u32 {
    contents.iter().map(|text| estimate_tokens(text)).sum()
}
