//! Storage traits and error types
//!
//! This module defines the trait interface for document store backends and
//! associated error types.

use crate::storage::{DocId, Document};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Document not found: {0}")]
    NotFound(DocId),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Corrupt store: {0}")]
    Corrupt(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for document store implementations
///
/// The store is the source of truth: every write is atomic, and a write
/// that fails leaves the previous state untouched.
pub trait DocumentStore {
    /// Allocates a fresh document id
    ///
    /// # Arguments
    ///
    /// * `now` - Current time in Unix seconds
    ///
    /// # Returns
    ///
    /// `now` if it is greater than every id ever issued, otherwise the
    /// high-water mark plus one. Ids are never reused, even after deletion.
    fn next_id(&mut self, now: DocId) -> StorageResult<DocId>;

    /// Creates or overwrites the document with `doc.id`
    fn put(&mut self, doc: &Document) -> StorageResult<()>;

    /// Gets a document by id
    fn get(&self, id: DocId) -> StorageResult<Document>;

    /// Deletes a document
    ///
    /// Returns [`StorageError::NotFound`] when no document has this id.
    fn delete(&mut self, id: DocId) -> StorageResult<()>;

    /// Returns every document, ordered by id
    fn scan_all(&self) -> StorageResult<Vec<Document>>;

    /// Scans every document and hands them to `f` while holding off writers
    ///
    /// Until `f` returns, writes through any other handle on the same store
    /// wait for the lock, and fail once their lock timeout expires, so the
    /// documents `f` sees cannot go stale under it.
    fn scan_exclusive<T, F>(&mut self, f: F) -> StorageResult<T>
    where
        F: FnOnce(Vec<Document>) -> T;

    /// Counts stored documents
    fn count(&self) -> StorageResult<u64>;
}
