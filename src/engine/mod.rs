//! Engine module: ingestion, deletion, rebuild and search
//!
//! [`Coordinator`] owns the document store and the search index and keeps
//! them consistent; [`QueryEngine`] turns keyword queries into ranked,
//! display-ready hits. [`open`] wires both to the on-disk SQLite backends
//! described by the configuration.

mod coordinator;
mod query;

pub use coordinator::{Coordinator, DeleteReport, EngineStats, IngestReport, RebuildReport};
pub use query::{format_time, QueryEngine, QueryHit, QueryResults, TIME_FORMAT};

use crate::config::Config;
use crate::extract::ExtractOptions;
use crate::fetch::Fetcher;
use crate::index::SqliteSearchIndex;
use crate::storage::SqliteDocumentStore;
use crate::tokenizer::DefaultTokenizer;
use crate::Result;
use std::sync::Arc;

/// Coordinator over the on-disk backends
pub type SqliteCoordinator = Coordinator<SqliteDocumentStore, SqliteSearchIndex>;

/// Opens the store and index named by `config`
///
/// The store directory is created if needed. Tokenizer resources are loaded
/// before either database is touched.
///
/// # Returns
///
/// * `Ok(SqliteCoordinator)` - Store, index and fetcher are ready
/// * `Err(ReadEngineError)` - A resource could not be opened
pub fn open(config: &Config) -> Result<SqliteCoordinator> {
    let tokenizer = Arc::new(DefaultTokenizer::from_config(&config.tokenizer)?);

    std::fs::create_dir_all(&config.store.path)?;
    let store = SqliteDocumentStore::new(&config.store.data_path())?;
    store.set_lock_timeout(config.store.lock_timeout())?;
    let index = SqliteSearchIndex::new(&config.store.index_path(), tokenizer)?;
    index.set_lock_timeout(config.store.lock_timeout())?;
    let fetcher = Fetcher::new(&config.fetch)?;

    tracing::debug!(store = %config.store.path.display(), "engine opened");
    Ok(Coordinator::new(
        store,
        index,
        fetcher,
        ExtractOptions::from(&config.extract),
    ))
}
