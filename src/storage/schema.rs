//! Database schema definitions
//!
//! This module contains the SQL schema of the document database.

/// SQL schema for the document database
pub const SCHEMA_SQL: &str = r#"
-- Canonical documents; the id is the ingestion time in Unix seconds
CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY,
    source TEXT NOT NULL,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    format TEXT NOT NULL DEFAULT 'plain'
);

-- Store-wide values such as the id high-water mark
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value INTEGER NOT NULL
);
"#;

/// Meta key holding the largest id ever issued
pub const HIGH_WATER_KEY: &str = "high_water";

/// Initializes the database schema
///
/// Creates all tables if they don't exist and adds the `format` column to
/// databases created before it. This is idempotent and safe to call
/// multiple times.
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;

    let has_format: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM pragma_table_info('documents') WHERE name = 'format'",
        [],
        |row| row.get(0),
    )?;
    if !has_format {
        conn.execute_batch("ALTER TABLE documents ADD COLUMN format TEXT NOT NULL DEFAULT 'plain'")?;
        tracing::info!("added format column to documents");
    }
    Ok(())
}
