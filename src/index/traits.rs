//! Search index trait and error types

use crate::index::{SearchRequest, SearchResults};
use crate::storage::{DocId, Document};
use thiserror::Error;

/// Errors that can occur during index operations
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Tokenizer produced an unindexable token: {0:?}")]
    Tokenize(String),
}

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;

/// Trait for full-text index implementations
///
/// An index entry is a pure function of the document and the tokenizer, so
/// indexing the same document twice leaves the index unchanged.
pub trait SearchIndex {
    /// Tokenizes and indexes a document, replacing any entry with its id
    fn index(&mut self, doc: &Document) -> IndexResult<()>;

    /// Removes a document; removing an absent id is not an error
    fn delete(&mut self, id: DocId) -> IndexResult<()>;

    /// Runs a keyword query
    ///
    /// Every query token must match in at least one requested field. A
    /// query without tokens matches nothing. Hits are ordered by relevance,
    /// ties by id descending.
    fn search(&self, request: &SearchRequest) -> IndexResult<SearchResults>;

    /// Counts indexed documents
    fn doc_count(&self) -> IndexResult<u64>;

    /// Removes every entry
    fn clear(&mut self) -> IndexResult<()>;

    /// Replaces the whole index with `docs`
    ///
    /// Documents that cannot be indexed are returned with their error; the
    /// rest are kept. Backends that support it make the swap atomic, so a
    /// reader sees either the old index or the complete new one.
    fn replace_all(&mut self, docs: &[Document]) -> IndexResult<Vec<(DocId, IndexError)>> {
        self.clear()?;
        let mut failed = Vec::new();
        for doc in docs {
            if let Err(e) = self.index(doc) {
                failed.push((doc.id, e));
            }
        }
        Ok(failed)
    }
}

/// Checks that tokens survive the space-joined encoding
pub(crate) fn check_tokens(tokens: &[String]) -> IndexResult<()> {
    match tokens.iter().find(|t| t.is_empty() || t.chars().any(char::is_whitespace)) {
        Some(bad) => Err(IndexError::Tokenize(bad.clone())),
        None => Ok(()),
    }
}
