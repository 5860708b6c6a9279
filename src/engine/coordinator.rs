//! Indexing coordinator - orchestrates writes across store and index
//!
//! This module drives a single ingestion through its states:
//! - fetching (or reading) and normalizing the page to UTF-8
//! - stripping comments and extracting title and description
//! - committing the document to the authoritative store
//! - indexing it, degrading gracefully when the index write fails
//!
//! It also owns deletion and the full index rebuild from the store. The
//! rebuild holds the store's write lock for its whole duration, so writers
//! on other handles wait for it instead of racing it.

use crate::extract::{extract, verify_images, strip_comments, ExtractOptions};
use crate::fetch::{normalize_to_utf8, Fetcher};
use crate::index::SearchIndex;
use crate::state::{IngestState, IngestTracker};
use crate::storage::{ContentFormat, DocId, Document, DocumentStore};
use crate::Result;
use chrono::Utc;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Outcome of one successful ingestion
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub document: Document,
    /// `Indexed`, or `Degraded` when only the store write succeeded
    pub state: IngestState,
    /// Why indexing failed, for a degraded ingestion
    pub index_error: Option<String>,
}

/// Outcome of a deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteReport {
    pub id: DocId,
    /// False when the index entry could not be removed; a rebuild fixes it
    pub index_removed: bool,
}

/// Outcome of a full rebuild
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildReport {
    /// Documents read from the store
    pub scanned: usize,
    /// Documents indexed successfully
    pub indexed: usize,
    /// Documents that could not be indexed
    pub failed: Vec<DocId>,
    /// Index size after the rebuild
    pub doc_count: u64,
}

/// Store and index sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineStats {
    pub documents: u64,
    pub indexed: u64,
}

/// Coordinates the document store and the search index
pub struct Coordinator<S, I> {
    store: S,
    index: I,
    fetcher: Fetcher,
    options: ExtractOptions,
}

impl<S: DocumentStore, I: SearchIndex> Coordinator<S, I> {
    /// Creates a coordinator over an existing store and index
    ///
    /// # Arguments
    ///
    /// * `store` - The authoritative document store
    /// * `index` - The derived search index
    /// * `fetcher` - HTTP fetcher for URL ingestion and image checks
    /// * `options` - Extraction switches
    pub fn new(store: S, index: I, fetcher: Fetcher, options: ExtractOptions) -> Self {
        Self {
            store,
            index,
            fetcher,
            options,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Fetches a page and ingests it
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute http(s) URL
    /// * `cancel` - Aborts the fetch when cancelled
    ///
    /// # Returns
    ///
    /// * `Ok(IngestReport)` - The document is stored (and normally indexed)
    /// * `Err(ReadEngineError)` - Nothing was stored
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn run() -> readengine::Result<()> {
    /// use readengine::config::Config;
    /// use tokio_util::sync::CancellationToken;
    ///
    /// let mut coordinator = readengine::engine::open(&Config::default())?;
    /// let report = coordinator
    ///     .ingest_url("https://example.com/post", &CancellationToken::new())
    ///     .await?;
    /// println!("{} {}", report.document.id, report.document.title);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn ingest_url(&mut self, url: &str, cancel: &CancellationToken) -> Result<IngestReport> {
        tracing::info!(url, "fetching");
        let mut tracker = IngestTracker::pending(url);
        let html = match self.fetcher.fetch(url, cancel).await {
            Ok(html) => html,
            Err(e) => {
                tracker.fail(&e);
                return Err(e.into());
            }
        };
        tracker.advance(IngestState::Fetched)?;
        self.ingest_tracked(tracker, url, &html).await
    }

    /// Reads a local HTML file and ingests it
    ///
    /// The bytes go through the same charset normalization as fetched
    /// pages; the path becomes the document source.
    pub async fn ingest_file(&mut self, path: &Path) -> Result<IngestReport> {
        let source = path.display().to_string();
        tracing::info!(source = %source, "reading file");
        let mut tracker = IngestTracker::pending(&source);

        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracker.fail(&e);
                return Err(e.into());
            }
        };
        let html = match normalize_to_utf8(&bytes) {
            Ok(html) => html,
            Err(e) => {
                tracker.fail(&e);
                return Err(e.into());
            }
        };
        tracker.advance(IngestState::Fetched)?;
        self.ingest_tracked(tracker, &source, &html).await
    }

    /// Ingests an already decoded page
    pub async fn ingest_html(&mut self, source: &str, html: &str) -> Result<IngestReport> {
        self.ingest_tracked(IngestTracker::fetched(source), source, html)
            .await
    }

    async fn ingest_tracked(
        &mut self,
        mut tracker: IngestTracker,
        source: &str,
        html: &str,
    ) -> Result<IngestReport> {
        let sanitized = strip_comments(html);
        tracker.advance(IngestState::Sanitized)?;

        let mut extracted = match extract(&sanitized, source, &self.options) {
            Ok(extracted) => extracted,
            Err(e) => {
                tracker.fail(&e);
                return Err(e.into());
            }
        };
        if !self.options.description_as_plain_text && !extracted.images.is_empty() {
            let reverted =
                verify_images(&self.fetcher, &mut extracted, self.options.image_request_timeout).await;
            if reverted > 0 {
                tracing::debug!(source, reverted, "kept original image references");
            }
        }
        tracker.advance(IngestState::Extracted)?;

        let document = match self.store_document(source, extracted.title, extracted.description) {
            Ok(document) => document,
            Err(e) => {
                tracker.fail(&e);
                return Err(e.into());
            }
        };
        tracker.advance(IngestState::Stored)?;

        let index_error = match self.index.index(&document) {
            Ok(()) => {
                tracker.advance(IngestState::Indexed)?;
                None
            }
            Err(e) => {
                tracing::warn!(
                    id = document.id,
                    error = %e,
                    "document stored but not indexed; run rebuild to repair"
                );
                tracker.advance(IngestState::Degraded)?;
                Some(e.to_string())
            }
        };

        tracing::info!(
            id = document.id,
            title = %document.title,
            state = %tracker.state(),
            "ingested"
        );
        Ok(IngestReport {
            document,
            state: tracker.state(),
            index_error,
        })
    }

    fn store_document(
        &mut self,
        source: &str,
        title: String,
        content: String,
    ) -> crate::storage::StorageResult<Document> {
        let format = if self.options.description_as_plain_text {
            ContentFormat::Plain
        } else {
            ContentFormat::Markup
        };
        let id = self.store.next_id(Utc::now().timestamp())?;
        let document = Document {
            id,
            source: source.to_string(),
            title,
            content,
            format,
        };
        self.store.put(&document)?;
        Ok(document)
    }

    /// Gets a stored document
    pub fn get(&self, id: DocId) -> Result<Document> {
        Ok(self.store.get(id)?)
    }

    /// Every stored document, oldest first
    pub fn history(&self) -> Result<Vec<Document>> {
        Ok(self.store.scan_all()?)
    }

    /// Deletes a document from the store, then from the index
    ///
    /// The store deletion must succeed (a missing id is an error). A failed
    /// index deletion is reported, not raised.
    pub fn delete(&mut self, id: DocId) -> Result<DeleteReport> {
        self.store.delete(id)?;

        let index_removed = match self.index.delete(id) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(id, error = %e, "document deleted but still indexed; run rebuild to repair");
                false
            }
        };

        tracing::info!(id, "deleted");
        Ok(DeleteReport { id, index_removed })
    }

    /// Rebuilds the search index from a full scan of the store
    ///
    /// The store stays write-locked from the scan until the new index is in
    /// place: a delete or ingestion from another handle waits up to its lock
    /// timeout and then fails, rather than being undone by the rebuild.
    /// Documents are indexed in id order. A document that fails to index is
    /// logged and counted; the rebuild carries on.
    pub fn rebuild(&mut self) -> Result<RebuildReport> {
        tracing::info!("rebuilding search index");

        let index = &mut self.index;
        let (scanned, outcome) = self
            .store
            .scan_exclusive(|documents| (documents.len(), index.replace_all(&documents)))?;
        let failures = outcome?;

        let mut report = RebuildReport {
            scanned,
            indexed: scanned - failures.len(),
            ..RebuildReport::default()
        };
        for (id, e) in failures {
            tracing::warn!(id, error = %e, "failed to index document");
            report.failed.push(id);
        }

        report.doc_count = self.index.doc_count()?;
        tracing::info!(
            scanned = report.scanned,
            indexed = report.indexed,
            failed = report.failed.len(),
            "rebuild complete"
        );
        Ok(report)
    }

    /// Store and index sizes
    pub fn stats(&self) -> Result<EngineStats> {
        Ok(EngineStats {
            documents: self.store.count()?,
            indexed: self.index.doc_count()?,
        })
    }
}
