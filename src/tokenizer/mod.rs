//! Tokenizer module: text to index terms
//!
//! The search index and the query engine share one [`Tokenizer`], so a
//! document and a query producing the same tokens are guaranteed to meet.
//! [`DefaultTokenizer`] handles Latin text by words and CJK text by
//! character bigrams, optionally enriched with a user dictionary.

mod default;

pub use default::{is_cjk, DefaultTokenizer};

/// Splits text into normalized search terms
///
/// Implementations must be deterministic: the index is rebuilt by
/// re-tokenizing stored documents and expects identical output.
pub trait Tokenizer: Send + Sync {
    /// Returns the terms of `text`, in order of appearance
    fn tokenize(&self, text: &str) -> Vec<String>;
}
