//! Substring profanity guard.
//!
//! The word list is loaded once at startup from a CSV-style file (first
//! column, one entry per line). A missing list disables the guard.

use log::warn;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct Guardrail {
    words: Vec<String>,
}

impl Guardrail {
    pub fn from_words(words: Vec<String>) -> Self {
        Self { words }
    }

    pub fn from_file(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(text) => {
                let words: Vec<String> = text
                    .lines()
                    .filter_map(|line| {
                        let word = line.split(',').next().unwrap_or_default().trim();
                        if word.is_empty() {
                            None
                        } else {
                            Some(word.to_string())
                        }
                    })
                    .collect();
                Self { words }
            }
            Err(_) => {
                warn!(
                    "Word list {} is missing; profanity filtering is disabled",
                    path.display()
                );
                Self::default()
            }
        }
    }

    pub fn contains_profanity(&self, text: &str) -> bool {
        self.words.iter().any(|word| text.contains(word))
    }

    /// Mask every listed word with asterisks of equal length.
    pub fn clean_text(&self, text: &str) -> String {
        let mut cleaned = text.to_string();
        for word in &self.words {
            let mask = "*".repeat(word.chars().count());
            cleaned = cleaned.replace(word, &mask);
        }
        cleaned
    }
}
