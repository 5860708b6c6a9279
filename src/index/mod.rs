//! Search index module: the derived full-text index
//!
//! This module handles keyword search over stored documents, including:
//! - Tokenization of title and content through the shared [`Tokenizer`]
//! - A SQLite FTS5 index in its own database file
//! - An in-memory index for tests and embedders
//! - Relevance ranking (title weighted above content) and highlighting
//!
//! The index holds nothing that cannot be recomputed from the document
//! store; it can be cleared and rebuilt at any time.
//!
//! [`Tokenizer`]: crate::tokenizer::Tokenizer

mod highlight;
mod memory;
mod schema;
mod sqlite;
mod traits;

pub use highlight::{highlight, MARK_CLOSE, MARK_OPEN};
pub use memory::MemorySearchIndex;
pub use sqlite::SqliteSearchIndex;
pub use traits::{IndexError, IndexResult, SearchIndex};

use crate::extract::markup_to_text;
use crate::storage::{ContentFormat, DocId, Document};
use std::borrow::Cow;

/// A searchable document field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Content,
}

impl Field {
    /// Every searchable field
    pub fn all() -> Vec<Field> {
        vec![Field::Title, Field::Content]
    }

    /// Indexed column holding this field's tokens
    pub fn column(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Content => "content",
        }
    }
}

/// A keyword query against the index
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    /// Raw query text, tokenized by the index
    pub query: String,
    /// Fields any query token may match in; empty means every field
    pub fields: Vec<Field>,
    /// Compute a highlighted snippet for each hit
    pub highlight: bool,
    /// Maximum number of hits returned
    pub limit: usize,
    /// Length of highlighted snippets (characters)
    pub snippet_chars: usize,
}

impl SearchRequest {
    /// Creates a request over every field, without highlighting
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            fields: Field::all(),
            highlight: false,
            limit: 10,
            snippet_chars: 160,
        }
    }

    pub fn with_fields(mut self, fields: Vec<Field>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_highlight(mut self, snippet_chars: usize) -> Self {
        self.highlight = true;
        self.snippet_chars = snippet_chars;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Requested fields, defaulting to all of them
    pub(crate) fn effective_fields(&self) -> Vec<Field> {
        if self.fields.is_empty() {
            Field::all()
        } else {
            self.fields.clone()
        }
    }
}

/// One ranked match
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: DocId,
    pub source: String,
    pub title: String,
    /// Relevance; higher is better
    pub score: f64,
    /// Highlighted excerpt, when requested and a match is visible
    pub snippet: Option<String>,
}

/// Outcome of a search
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    /// Number of matching documents, before the limit is applied
    pub total: u64,
    /// At most `limit` hits, best first
    pub hits: Vec<SearchHit>,
}

/// The text of a document's content as a reader sees it
///
/// Markup is reduced to its visible text, so tag and attribute names are
/// never indexed and snippets never cut through a tag.
pub(crate) fn visible_content(doc: &Document) -> Cow<'_, str> {
    match doc.format {
        ContentFormat::Plain => Cow::Borrowed(&doc.content),
        ContentFormat::Markup => Cow::Owned(markup_to_text(&doc.content)),
    }
}

/// Distinct tokens of a query, in first-seen order
pub(crate) fn query_terms(tokens: Vec<String>) -> Vec<String> {
    let mut terms: Vec<String> = Vec::with_capacity(tokens.len());
    for token in tokens {
        if !terms.contains(&token) {
            terms.push(token);
        }
    }
    terms
}

/// Snippet from the first requested field with a visible match
///
/// Content is preferred; the title is used when only it matched.
pub(crate) fn snippet_for(
    request: &SearchRequest,
    terms: &[String],
    title: &str,
    content: &str,
) -> Option<String> {
    if !request.highlight {
        return None;
    }
    let fields = request.effective_fields();
    [(Field::Content, content), (Field::Title, title)]
        .into_iter()
        .filter(|(field, _)| fields.contains(field))
        .find_map(|(_, text)| highlight(text, terms, request.snippet_chars))
}
