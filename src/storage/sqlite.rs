//! SQLite document store
//!
//! This module provides a SQLite-based implementation of the DocumentStore
//! trait. Every write runs in its own immediate transaction; a transaction
//! dropped before commit rolls back. Writers on other connections wait up to
//! the lock timeout for the write lock, then fail with `SQLITE_BUSY`.

use crate::storage::schema::{initialize_schema, HIGH_WATER_KEY};
use crate::storage::traits::{DocumentStore, StorageError, StorageResult};
use crate::storage::{allocate_id, ContentFormat, DocId, Document};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::path::Path;
use std::time::Duration;

/// SQLite document store backend
pub struct SqliteDocumentStore {
    conn: Connection,
}

impl SqliteDocumentStore {
    /// Opens or creates a document database
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteDocumentStore)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        tracing::debug!(path = %path.display(), "document store opened");
        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Sets how long a write waits for another connection's lock
    pub fn set_lock_timeout(&self, timeout: Duration) -> StorageResult<()> {
        self.conn.busy_timeout(timeout)?;
        Ok(())
    }

    fn write_transaction(&mut self) -> StorageResult<Transaction<'_>> {
        Ok(self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?)
    }

    fn scan(conn: &Connection) -> StorageResult<Vec<Document>> {
        let mut stmt =
            conn.prepare("SELECT id, source, title, content, format FROM documents ORDER BY id")?;
        let documents = stmt
            .query_map([], document_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(documents)
    }

    fn high_water(tx: &Transaction<'_>) -> StorageResult<DocId> {
        let value = tx
            .query_row(
                "SELECT value FROM meta WHERE key = ?1",
                params![HIGH_WATER_KEY],
                |row| row.get::<_, DocId>(0),
            )
            .optional()?;
        Ok(value.unwrap_or(0))
    }

    fn raise_high_water(tx: &Transaction<'_>, id: DocId) -> StorageResult<()> {
        tx.execute(
            "INSERT INTO meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = MAX(value, excluded.value)",
            params![HIGH_WATER_KEY, id],
        )?;
        Ok(())
    }
}

impl ToSql for ContentFormat {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for ContentFormat {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let name = value.as_str()?;
        ContentFormat::parse(name)
            .ok_or_else(|| FromSqlError::Other(format!("unknown content format {:?}", name).into()))
    }
}

fn document_from_row(row: &Row<'_>) -> rusqlite::Result<Document> {
    Ok(Document {
        id: row.get(0)?,
        source: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        format: row.get(4)?,
    })
}

impl DocumentStore for SqliteDocumentStore {
    fn next_id(&mut self, now: DocId) -> StorageResult<DocId> {
        let tx = self.write_transaction()?;
        let id = allocate_id(now, Self::high_water(&tx)?)?;
        Self::raise_high_water(&tx, id)?;
        tx.commit()?;
        Ok(id)
    }

    fn put(&mut self, doc: &Document) -> StorageResult<()> {
        let tx = self.write_transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO documents (id, source, title, content, format)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![doc.id, doc.source, doc.title, doc.content, doc.format],
        )?;
        Self::raise_high_water(&tx, doc.id)?;
        tx.commit()?;

        tracing::debug!(id = doc.id, "document stored");
        Ok(())
    }

    fn get(&self, id: DocId) -> StorageResult<Document> {
        self.conn
            .query_row(
                "SELECT id, source, title, content, format FROM documents WHERE id = ?1",
                params![id],
                document_from_row,
            )
            .optional()?
            .ok_or(StorageError::NotFound(id))
    }

    fn delete(&mut self, id: DocId) -> StorageResult<()> {
        let tx = self.write_transaction()?;
        let removed = tx.execute("DELETE FROM documents WHERE id = ?1", params![id])?;
        if removed == 0 {
            return Err(StorageError::NotFound(id));
        }
        tx.commit()?;
        Ok(())
    }

    fn scan_all(&self) -> StorageResult<Vec<Document>> {
        Self::scan(&self.conn)
    }

    fn scan_exclusive<T, F>(&mut self, f: F) -> StorageResult<T>
    where
        F: FnOnce(Vec<Document>) -> T,
    {
        let tx = self.write_transaction()?;
        let documents = Self::scan(&tx)?;
        let result = f(documents);
        tx.commit()?;
        Ok(result)
    }

    fn count(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
