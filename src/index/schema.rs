//! Search index schema
//!
//! One FTS5 table keyed by the document id (its rowid). The indexed columns
//! hold space-joined tokens produced by the crate tokenizer; the raw text is
//! kept alongside, unindexed, for result projection and highlighting.

/// SQL schema for the index database
pub const SCHEMA_SQL: &str = r#"
CREATE VIRTUAL TABLE IF NOT EXISTS documents_fts USING fts5(
    source UNINDEXED,
    title_text UNINDEXED,
    content_text UNINDEXED,
    title,
    content,
    tokenize = 'unicode61 remove_diacritics 0'
);
"#;

/// Drops the index table
pub const DROP_SQL: &str = "DROP TABLE IF EXISTS documents_fts;";

/// Column weights for `bm25()`, in declaration order: title counts double
pub const BM25_WEIGHTS: &str = "0.0, 0.0, 0.0, 2.0, 1.0";

/// Initializes the index schema (idempotent)
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
