//! In-memory document store

use crate::storage::traits::{DocumentStore, StorageError, StorageResult};
use crate::storage::{allocate_id, DocId, Document};
use std::collections::BTreeMap;

/// Document store kept entirely in memory
///
/// Same contract as the SQLite store, without durability.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: BTreeMap<DocId, Document>,
    high_water: DocId,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn next_id(&mut self, now: DocId) -> StorageResult<DocId> {
        let id = allocate_id(now, self.high_water)?;
        self.high_water = id;
        Ok(id)
    }

    fn put(&mut self, doc: &Document) -> StorageResult<()> {
        self.high_water = self.high_water.max(doc.id);
        self.documents.insert(doc.id, doc.clone());
        Ok(())
    }

    fn get(&self, id: DocId) -> StorageResult<Document> {
        self.documents
            .get(&id)
            .cloned()
            .ok_or(StorageError::NotFound(id))
    }

    fn delete(&mut self, id: DocId) -> StorageResult<()> {
        self.documents
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::NotFound(id))
    }

    fn scan_all(&self) -> StorageResult<Vec<Document>> {
        Ok(self.documents.values().cloned().collect())
    }

    fn scan_exclusive<T, F>(&mut self, f: F) -> StorageResult<T>
    where
        F: FnOnce(Vec<Document>) -> T,
    {
        Ok(f(self.scan_all()?))
    }

    fn count(&self) -> StorageResult<u64> {
        Ok(self.documents.len() as u64)
    }
}
