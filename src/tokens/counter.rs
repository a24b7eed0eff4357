//! Token counter implementation
//!
//! Uses tiktoken-rs (`cl100k_base`) to measure messages that arrive without
//! an explicit context-token count. Very long messages are estimated from
//! their byte length instead so the routing path stays within its latency
//! budget.

use once_cell::sync::Lazy;
use tiktoken_rs::{cl100k_base, CoreBPE};
use tracing::warn;

/// Messages longer than this are estimated rather than encoded
pub const EXACT_COUNT_LIMIT_BYTES: usize = 32 * 1024;

/// Average bytes per token used for the length-based estimate
const BYTES_PER_TOKEN: usize = 4;

/// Shared encoder, loaded on first use
static ENCODER: Lazy<Option<CoreBPE>> = Lazy::new(|| match cl100k_base() {
    Ok(bpe) => Some(bpe),
    Err(e) => {
        warn!("Failed to load cl100k_base encoder, using length estimate: {}", e);
        None
    }
});

/// Measures message size in tokens
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenCounter;

impl TokenCounter {
    /// Create a new token counter
    pub fn new() -> Self {
        Self
    }

    /// Token count using the cl100k_base encoding
    ///
    /// Falls back to the length estimate if the encoder could not be loaded.
    pub fn count_tokens(&self, text: &str) -> usize {
        match ENCODER.as_ref() {
            Some(encoder) => encoder.encode_with_special_tokens(text).len(),
            None => length_estimate(text),
        }
    }

    /// Token count for routing decisions
    ///
    /// Exact below [`EXACT_COUNT_LIMIT_BYTES`], length-based above it.
    pub fn estimate_tokens(&self, text: &str) -> u32 {
        let count = if text.len() <= EXACT_COUNT_LIMIT_BYTES {
            self.count_tokens(text)
        } else {
            length_estimate(text)
        };
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}

fn length_estimate(text: &str) -> usize {
    text.len().div_ceil(BYTES_PER_TOKEN)
}
