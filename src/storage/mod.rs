//! Storage module: the authoritative document store
//!
//! This module handles persistence of ingested documents, including:
//! - SQLite database initialization and schema management
//! - Document id allocation with a persisted high-water mark
//! - Transactional create-or-overwrite, lookup, deletion and full scans
//! - An in-memory store for tests and embedders
//!
//! The search index is derived from this store and can always be rebuilt
//! from [`DocumentStore::scan_exclusive`].

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemoryDocumentStore;
pub use sqlite::SqliteDocumentStore;
pub use traits::{DocumentStore, StorageError, StorageResult};

use chrono::{DateTime, Local, TimeZone};

/// Document identifier: the ingestion time in Unix seconds, made unique
pub type DocId = i64;

/// How a document's content is encoded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ContentFormat {
    /// Paragraphs of plain text separated by blank lines
    #[default]
    Plain,
    /// Minimal HTML, as rendered when descriptions keep their markup
    Markup,
}

impl ContentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Markup => "markup",
        }
    }

    /// Parses the stored name of a format
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "plain" => Some(Self::Plain),
            "markup" => Some(Self::Markup),
            _ => None,
        }
    }
}

/// A stored document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: DocId,
    /// Originating URL or file path
    pub source: String,
    pub title: String,
    /// Extracted main content
    pub content: String,
    pub format: ContentFormat,
}

impl Document {
    /// Creates a plain-text document
    pub fn new(
        id: DocId,
        source: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id,
            source: source.into(),
            title: title.into(),
            content: content.into(),
            format: ContentFormat::Plain,
        }
    }

    pub fn with_format(mut self, format: ContentFormat) -> Self {
        self.format = format;
        self
    }

    /// Ingestion time in local time, derived from the id
    pub fn ingested_at(&self) -> Option<DateTime<Local>> {
        ingested_at(self.id)
    }
}

/// Converts a document id back into its local ingestion time
pub fn ingested_at(id: DocId) -> Option<DateTime<Local>> {
    Local.timestamp_opt(id, 0).single()
}

/// Allocates the id following `high_water` for a clock reading of `now`
///
/// The clock value is used when it is ahead of every id issued so far;
/// otherwise the id is `high_water + 1`.
pub(crate) fn allocate_id(now: DocId, high_water: DocId) -> StorageResult<DocId> {
    if now > high_water {
        return Ok(now);
    }
    high_water
        .checked_add(1)
        .ok_or_else(|| StorageError::Corrupt(format!("id space exhausted at {}", high_water)))
}
