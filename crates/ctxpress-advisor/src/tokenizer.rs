//! Token counting backends

use crate::error::{AdvisorError, AdvisorResult};
use tiktoken_rs::{cl100k_base, get_bpe_from_model, o200k_base, p50k_base, r50k_base, CoreBPE};

const CHARS_PER_TOKEN: usize = 4;

/// Counts model tokens in a piece of text
pub trait Tokenizer: Send + Sync {
    fn count_tokens(&self, text: &str) -> usize;
}

impl<T: Tokenizer + ?Sized> Tokenizer for Box<T> {
    fn count_tokens(&self, text: &str) -> usize {
        (**self).count_tokens(text)
    }
}

impl<T: Tokenizer + ?Sized> Tokenizer for &T {
    fn count_tokens(&self, text: &str) -> usize {
        (**self).count_tokens(text)
    }
}

/// BPE tokenizer from tiktoken-rs
pub struct TiktokenTokenizer {
    bpe: CoreBPE,
    name: String,
}

impl TiktokenTokenizer {
    /// Create a tokenizer for a model name (e.g. "gpt-4") or an encoding
    /// name ("cl100k_base", "o200k_base", "p50k_base", "r50k_base").
    pub fn new(model_or_encoding: &str) -> AdvisorResult<Self> {
        let lower = model_or_encoding.to_ascii_lowercase();

        let bpe = match get_bpe_from_model(&lower) {
            Ok(bpe) => bpe,
            Err(_) => match lower.as_str() {
                "cl100k_base" => cl100k_base(),
                "o200k_base" => o200k_base(),
                "p50k_base" => p50k_base(),
                "r50k_base" => r50k_base(),
                _ => {
                    return Err(AdvisorError::UnsupportedEncoding(
                        model_or_encoding.to_string(),
                    ))
                }
            }
            .map_err(|e| AdvisorError::UnsupportedEncoding(format!("{}: {}", lower, e)))?,
        };

        Ok(Self { bpe, name: lower })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Tokenizer for TiktokenTokenizer {
    fn count_tokens(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}

impl std::fmt::Debug for TiktokenTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TiktokenTokenizer")
            .field("name", &self.name)
            .finish()
    }
}

/// One token per whitespace-separated word
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn count_tokens(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}

/// Rough estimate of one token per four bytes, rounded up
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproxTokenizer;

impl Tokenizer for ApproxTokenizer {
    fn count_tokens(&self, text: &str) -> usize {
        text.len().div_ceil(CHARS_PER_TOKEN)
    }
}

/// Resolve a tokenizer by name: "words", "approx", or a tiktoken model/encoding
pub fn tokenizer_for(name: &str) -> AdvisorResult<Box<dyn Tokenizer>> {
    match name.to_ascii_lowercase().as_str() {
        "words" | "whitespace" => Ok(Box::new(WhitespaceTokenizer)),
        "approx" => Ok(Box::new(ApproxTokenizer)),
        _ => Ok(Box::new(TiktokenTokenizer::new(name)?)),
    }
}
