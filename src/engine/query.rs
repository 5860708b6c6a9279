//! Query engine - keyword search with display-ready results

use crate::config::SearchConfig;
use crate::index::{Field, SearchIndex, SearchRequest};
use crate::storage::{ingested_at, DocId};
use crate::Result;

/// Format of the ingestion time shown with each hit
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One ranked, display-ready hit
#[derive(Debug, Clone, PartialEq)]
pub struct QueryHit {
    pub id: DocId,
    pub source: String,
    pub title: String,
    /// Highlighted excerpt, when a match is visible in the text
    pub snippet: Option<String>,
    pub score: f64,
    /// Local ingestion time, formatted with [`TIME_FORMAT`]
    pub ingested_at: String,
}

/// Results of a keyword query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResults {
    /// Number of matching documents, before the limit
    pub total: u64,
    pub hits: Vec<QueryHit>,
}

/// Runs keyword queries over title and content with highlighting
#[derive(Debug, Clone)]
pub struct QueryEngine {
    limit: usize,
    snippet_chars: usize,
}

impl QueryEngine {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            limit: config.limit,
            snippet_chars: config.snippet_chars,
        }
    }

    /// Searches `index` for `keyword`
    ///
    /// # Arguments
    ///
    /// * `index` - The search index to query
    /// * `keyword` - Raw query text; every token must match
    /// * `limit` - Maximum hits, defaulting to the configured limit
    ///
    /// # Returns
    ///
    /// Ranked hits, best first. No match is an empty result, not an error.
    pub fn search<I: SearchIndex>(
        &self,
        index: &I,
        keyword: &str,
        limit: Option<usize>,
    ) -> Result<QueryResults> {
        let request = SearchRequest::new(keyword)
            .with_fields(vec![Field::Title, Field::Content])
            .with_highlight(self.snippet_chars)
            .with_limit(limit.unwrap_or(self.limit));

        let results = index.search(&request)?;
        tracing::debug!(keyword, total = results.total, "search complete");

        let hits = results
            .hits
            .into_iter()
            .map(|hit| QueryHit {
                ingested_at: format_time(hit.id),
                id: hit.id,
                source: hit.source,
                title: hit.title,
                snippet: hit.snippet,
                score: hit.score,
            })
            .collect();

        Ok(QueryResults {
            total: results.total,
            hits,
        })
    }
}

/// Formats the ingestion time encoded in a document id
pub fn format_time(id: DocId) -> String {
    ingested_at(id)
        .map(|t| t.format(TIME_FORMAT).to_string())
        .unwrap_or_else(|| id.to_string())
}
