//! In-memory search index

use crate::index::traits::{check_tokens, IndexResult, SearchIndex};
use crate::index::{query_terms, snippet_for, visible_content, Field, SearchHit, SearchRequest, SearchResults};
use crate::storage::{DocId, Document};
use crate::tokenizer::Tokenizer;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Term frequencies of one document field
type Postings = HashMap<String, u32>;

struct Entry {
    document: Document,
    /// Content as shown to readers, used for snippets
    text: String,
    title: Postings,
    content: Postings,
    length: usize,
}

/// Index kept entirely in memory
///
/// Scores are term frequencies (title counted twice) normalized by the
/// square root of the document length.
pub struct MemorySearchIndex {
    entries: BTreeMap<DocId, Entry>,
    tokenizer: Arc<dyn Tokenizer>,
}

impl MemorySearchIndex {
    pub fn new(tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self {
            entries: BTreeMap::new(),
            tokenizer,
        }
    }

    fn postings(&self, text: &str) -> IndexResult<(Postings, usize)> {
        let tokens = self.tokenizer.tokenize(text);
        check_tokens(&tokens)?;
        let length = tokens.len();
        let mut postings = Postings::new();
        for token in tokens {
            *postings.entry(token).or_insert(0) += 1;
        }
        Ok((postings, length))
    }
}

impl Entry {
    fn score(&self, terms: &[String], fields: &[Field]) -> Option<f64> {
        let mut total = 0.0;
        for term in terms {
            let in_title = if fields.contains(&Field::Title) {
                self.title.get(term).copied().unwrap_or(0)
            } else {
                0
            };
            let in_content = if fields.contains(&Field::Content) {
                self.content.get(term).copied().unwrap_or(0)
            } else {
                0
            };
            if in_title + in_content == 0 {
                return None;
            }
            total += f64::from(2 * in_title + in_content);
        }
        Some(total / (self.length.max(1) as f64).sqrt())
    }
}

impl SearchIndex for MemorySearchIndex {
    fn index(&mut self, doc: &Document) -> IndexResult<()> {
        let text = visible_content(doc).into_owned();
        let (title, title_len) = self.postings(&doc.title)?;
        let (content, content_len) = self.postings(&text)?;
        self.entries.insert(
            doc.id,
            Entry {
                document: doc.clone(),
                text,
                title,
                content,
                length: title_len + content_len,
            },
        );
        Ok(())
    }

    fn delete(&mut self, id: DocId) -> IndexResult<()> {
        self.entries.remove(&id);
        Ok(())
    }

    fn search(&self, request: &SearchRequest) -> IndexResult<SearchResults> {
        let terms = query_terms(self.tokenizer.tokenize(&request.query));
        if terms.is_empty() {
            return Ok(SearchResults::default());
        }
        let fields = request.effective_fields();

        let mut matches: Vec<(f64, &Entry)> = self
            .entries
            .values()
            .filter_map(|entry| entry.score(&terms, &fields).map(|score| (score, entry)))
            .collect();
        matches.sort_by(|(a, ea), (b, eb)| {
            b.total_cmp(a)
                .then_with(|| eb.document.id.cmp(&ea.document.id))
        });

        let total = matches.len() as u64;
        let hits = matches
            .into_iter()
            .take(request.limit)
            .map(|(score, entry)| {
                let doc = &entry.document;
                SearchHit {
                    id: doc.id,
                    source: doc.source.clone(),
                    title: doc.title.clone(),
                    score,
                    snippet: snippet_for(request, &terms, &doc.title, &entry.text),
                }
            })
            .collect();

        Ok(SearchResults { total, hits })
    }

    fn doc_count(&self) -> IndexResult<u64> {
        Ok(self.entries.len() as u64)
    }

    fn clear(&mut self) -> IndexResult<()> {
        self.entries.clear();
        Ok(())
    }
}
