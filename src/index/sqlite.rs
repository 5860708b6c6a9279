//! SQLite FTS5 search index

use crate::index::schema::{initialize_schema, BM25_WEIGHTS, DROP_SQL};
use crate::index::traits::{check_tokens, IndexError, IndexResult, SearchIndex};
use crate::index::{query_terms, snippet_for, visible_content, Field, SearchHit, SearchRequest, SearchResults};
use crate::storage::{DocId, Document};
use crate::tokenizer::Tokenizer;
use rusqlite::{params, Connection, TransactionBehavior};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Full-text index stored in its own SQLite database
pub struct SqliteSearchIndex {
    conn: Connection,
    tokenizer: Arc<dyn Tokenizer>,
}

impl SqliteSearchIndex {
    /// Opens or creates an index database
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the index database file
    /// * `tokenizer` - Tokenizer applied to documents and queries alike
    pub fn new(path: &Path, tokenizer: Arc<dyn Tokenizer>) -> IndexResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;
        initialize_schema(&conn)?;

        tracing::debug!(path = %path.display(), "search index opened");
        Ok(Self { conn, tokenizer })
    }

    /// Creates an in-memory index
    pub fn new_in_memory(tokenizer: Arc<dyn Tokenizer>) -> IndexResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn, tokenizer })
    }

    /// Sets how long a write waits for another connection's lock
    pub fn set_lock_timeout(&self, timeout: Duration) -> IndexResult<()> {
        self.conn.busy_timeout(timeout)?;
        Ok(())
    }
}

fn joined_tokens(tokenizer: &dyn Tokenizer, text: &str) -> IndexResult<String> {
    let tokens = tokenizer.tokenize(text);
    check_tokens(&tokens)?;
    Ok(tokens.join(" "))
}

/// Writes the entry of `doc`, replacing any entry with its id
fn write_entry(conn: &Connection, tokenizer: &dyn Tokenizer, doc: &Document) -> IndexResult<()> {
    let content_text = visible_content(doc);
    let title = joined_tokens(tokenizer, &doc.title)?;
    let content = joined_tokens(tokenizer, &content_text)?;

    conn.execute("DELETE FROM documents_fts WHERE rowid = ?1", params![doc.id])?;
    conn.execute(
        "INSERT INTO documents_fts (rowid, source, title_text, content_text, title, content)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![doc.id, doc.source, doc.title, content_text, title, content],
    )?;
    Ok(())
}

/// Builds the FTS5 MATCH expression: every term, in any requested column
fn match_expression(terms: &[String], fields: &[Field]) -> String {
    let columns = fields.iter().map(Field::column).collect::<Vec<_>>().join(" ");
    terms
        .iter()
        .map(|term| format!("{{{}}} : \"{}\"", columns, term.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(" AND ")
}

impl SearchIndex for SqliteSearchIndex {
    fn index(&mut self, doc: &Document) -> IndexResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        write_entry(&tx, self.tokenizer.as_ref(), doc)?;
        tx.commit()?;

        tracing::debug!(id = doc.id, "document indexed");
        Ok(())
    }

    fn delete(&mut self, id: DocId) -> IndexResult<()> {
        self.conn
            .execute("DELETE FROM documents_fts WHERE rowid = ?1", params![id])?;
        Ok(())
    }

    fn search(&self, request: &SearchRequest) -> IndexResult<SearchResults> {
        let terms = query_terms(self.tokenizer.tokenize(&request.query));
        if terms.is_empty() || request.limit == 0 {
            return Ok(SearchResults::default());
        }
        check_tokens(&terms)?;

        let expression = match_expression(&terms, &request.effective_fields());
        tracing::trace!(%expression, "fts query");

        let total: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents_fts WHERE documents_fts MATCH ?1",
            params![expression],
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT rowid, source, title_text, content_text, bm25(documents_fts, {}) AS score
             FROM documents_fts WHERE documents_fts MATCH ?1
             ORDER BY score ASC, rowid DESC LIMIT ?2",
            BM25_WEIGHTS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![expression, request.limit as i64], |row| {
            Ok((
                row.get::<_, DocId>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, f64>(4)?,
            ))
        })?;

        let mut hits = Vec::new();
        for row in rows {
            let (id, source, title, content, bm25) = row?;
            let snippet = snippet_for(request, &terms, &title, &content);
            hits.push(SearchHit {
                id,
                source,
                title,
                // bm25() is lower-is-better
                score: -bm25,
                snippet,
            });
        }

        Ok(SearchResults {
            total: total as u64,
            hits,
        })
    }

    fn doc_count(&self) -> IndexResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM documents_fts", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn clear(&mut self) -> IndexResult<()> {
        self.conn.execute_batch(DROP_SQL)?;
        initialize_schema(&self.conn)?;
        tracing::debug!("search index cleared");
        Ok(())
    }

    /// Clears and refills the index in one immediate transaction
    ///
    /// Readers keep seeing the previous index until the commit; other
    /// writers wait for the lock.
    fn replace_all(&mut self, docs: &[Document]) -> IndexResult<Vec<(DocId, IndexError)>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute_batch(DROP_SQL)?;
        initialize_schema(&tx)?;

        let mut failed = Vec::new();
        for doc in docs {
            if let Err(e) = write_entry(&tx, self.tokenizer.as_ref(), doc) {
                failed.push((doc.id, e));
            }
        }

        tx.commit()?;
        tracing::debug!(documents = docs.len(), failed = failed.len(), "search index replaced");
        Ok(failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ContentFormat;
    use crate::tokenizer::DefaultTokenizer;
    use tempfile::TempDir;

    fn index() -> SqliteSearchIndex {
        SqliteSearchIndex::new_in_memory(Arc::new(DefaultTokenizer::new())).unwrap()
    }

    fn ids(results: &SearchResults) -> Vec<DocId> {
        results.hits.iter().map(|h| h.id).collect()
    }

    #[test]
    fn test_match_expression() {
        let expr = match_expression(&["rust".into(), "a\"b".into()], &[Field::Title, Field::Content]);
        assert_eq!(expr, "{title content} : \"rust\" AND {title content} : \"a\"\"b\"");
    }

    #[test]
    fn test_index_and_search() {
        let mut index = index();
        index
            .index(&Document::new(1, "https://a", "Rust notes", "Ownership and borrowing"))
            .unwrap();
        index
            .index(&Document::new(2, "https://b", "Cooking", "Pasta with tomato"))
            .unwrap();

        let results = index.search(&SearchRequest::new("borrowing")).unwrap();
        assert_eq!(results.total, 1);
        assert_eq!(results.hits[0].id, 1);
        assert_eq!(results.hits[0].title, "Rust notes");
        assert_eq!(results.hits[0].source, "https://a");
        assert!(results.hits[0].snippet.is_none());
    }

    #[test]
    fn test_all_terms_required() {
        let mut index = index();
        index.index(&Document::new(1, "s", "t", "alpha beta")).unwrap();
        index.index(&Document::new(2, "s", "t", "alpha gamma")).unwrap();

        let results = index.search(&SearchRequest::new("alpha beta")).unwrap();
        assert_eq!(ids(&results), vec![1]);
    }

    #[test]
    fn test_title_outranks_content() {
        let mut index = index();
        index.index(&Document::new(1, "s", "Other", "rust appears in body")).unwrap();
        index.index(&Document::new(2, "s", "Rust", "body without the term")).unwrap();

        let results = index.search(&SearchRequest::new("rust")).unwrap();
        assert_eq!(ids(&results), vec![2, 1]);
        assert!(results.hits[0].score >= results.hits[1].score);
    }

    #[test]
    fn test_ties_break_by_id_descending() {
        let mut index = index();
        for id in [5, 9, 7] {
            index.index(&Document::new(id, "s", "same", "identical text")).unwrap();
        }
        let results = index.search(&SearchRequest::new("identical")).unwrap();
        assert_eq!(ids(&results), vec![9, 7, 5]);
    }

    #[test]
    fn test_field_restriction() {
        let mut index = index();
        index.index(&Document::new(1, "s", "Title word", "content word")).unwrap();
        let request = SearchRequest::new("content").with_fields(vec![Field::Title]);
        assert_eq!(index.search(&request).unwrap().total, 0);
    }

    #[test]
    fn test_cjk_search_with_highlight() {
        let mut index = index();
        index
            .index(&Document::new(1, "s", "笔记", "这是一个全文搜索引擎的例子"))
            .unwrap();

        let request = SearchRequest::new("搜索引擎").with_highlight(100);
        let results = index.search(&request).unwrap();
        assert_eq!(results.total, 1);
        assert_eq!(
            results.hits[0].snippet.as_deref(),
            Some("这是一个全文<mark>搜索引擎</mark>的例子")
        );
    }

    #[test]
    fn test_empty_query_matches_nothing() {
        let mut index = index();
        index.index(&Document::new(1, "s", "t", "text")).unwrap();
        let results = index.search(&SearchRequest::new("  ,. ")).unwrap();
        assert_eq!(results, SearchResults::default());
    }

    #[test]
    fn test_limit_and_total() {
        let mut index = index();
        for id in 1..=5 {
            index.index(&Document::new(id, "s", "t", "common")).unwrap();
        }
        let results = index.search(&SearchRequest::new("common").with_limit(2)).unwrap();
        assert_eq!(results.total, 5);
        assert_eq!(results.hits.len(), 2);
    }

    #[test]
    fn test_reindex_replaces_entry() {
        let mut index = index();
        index.index(&Document::new(1, "s", "t", "old words")).unwrap();
        index.index(&Document::new(1, "s", "t", "new words")).unwrap();

        assert_eq!(index.doc_count().unwrap(), 1);
        assert_eq!(index.search(&SearchRequest::new("old")).unwrap().total, 0);
        assert_eq!(index.search(&SearchRequest::new("new")).unwrap().total, 1);
    }

    #[test]
    fn test_delete_and_clear() {
        let mut index = index();
        index.index(&Document::new(1, "s", "t", "one")).unwrap();
        index.index(&Document::new(2, "s", "t", "two")).unwrap();

        index.delete(1).unwrap();
        index.delete(42).unwrap();
        assert_eq!(index.doc_count().unwrap(), 1);

        index.clear().unwrap();
        assert_eq!(index.doc_count().unwrap(), 0);
        assert_eq!(index.search(&SearchRequest::new("two")).unwrap().total, 0);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.db");
        {
            let mut index = SqliteSearchIndex::new(&path, Arc::new(DefaultTokenizer::new())).unwrap();
            index.index(&Document::new(1, "s", "t", "durable")).unwrap();
        }
        let index = SqliteSearchIndex::new(&path, Arc::new(DefaultTokenizer::new())).unwrap();
        assert_eq!(index.search(&SearchRequest::new("durable")).unwrap().total, 1);
    }

    #[test]
    fn test_markup_indexed_as_visible_text() {
        let mut index = index();
        let doc = Document::new(
            1,
            "https://example.com/cats",
            "Cats",
            r#"<p>Cats <a href="https://example.com/more">sleep</a> most of the day.</p>"#,
        )
        .with_format(ContentFormat::Markup);
        index.index(&doc).unwrap();

        for markup_word in ["href", "https", "com", "p", "a"] {
            let results = index.search(&SearchRequest::new(markup_word)).unwrap();
            assert_eq!(results.total, 0, "{} should not match", markup_word);
        }

        let results = index.search(&SearchRequest::new("sleep").with_highlight(100)).unwrap();
        assert_eq!(results.total, 1);
        assert_eq!(
            results.hits[0].snippet.as_deref(),
            Some("Cats <mark>sleep</mark> most of the day.")
        );
    }

    #[test]
    fn test_replace_all_swaps_contents() {
        let mut index = index();
        index.index(&Document::new(1, "s", "t", "stale")).unwrap();

        let docs = vec![
            Document::new(2, "s", "t", "fresh"),
            Document::new(3, "s", "t", "fresher"),
        ];
        let failed = index.replace_all(&docs).unwrap();

        assert!(failed.is_empty());
        assert_eq!(index.doc_count().unwrap(), 2);
        assert_eq!(index.search(&SearchRequest::new("stale")).unwrap().total, 0);
        assert_eq!(index.search(&SearchRequest::new("fresh")).unwrap().total, 1);
    }

    #[test]
    fn test_replace_all_is_invisible_until_commit() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.db");
        let mut writer = SqliteSearchIndex::new(&path, Arc::new(DefaultTokenizer::new())).unwrap();
        writer.index(&Document::new(1, "s", "t", "original")).unwrap();

        let reader = SqliteSearchIndex::new(&path, Arc::new(DefaultTokenizer::new())).unwrap();
        let tx = writer
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .unwrap();
        tx.execute_batch(DROP_SQL).unwrap();
        initialize_schema(&tx).unwrap();

        // Mid-swap the reader still sees the committed index
        assert_eq!(reader.doc_count().unwrap(), 1);
        assert_eq!(reader.search(&SearchRequest::new("original")).unwrap().total, 1);
        drop(tx);
        assert_eq!(reader.doc_count().unwrap(), 1);
    }
}
