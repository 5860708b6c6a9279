//! Extraction module: from raw HTML to a title and a main-content description
//!
//! The pipeline is:
//! 1. strip comment blocks ([`strip_comments`])
//! 2. parse the document (tolerant of malformed markup)
//! 3. derive the title
//! 4. score block candidates and select the main-content root, falling back
//!    to the whole body when nothing qualifies
//! 5. render the selected subtree as plain text or minimal markup

mod dom;
mod images;
mod render;
mod sanitize;
mod scoring;
mod title;

pub use dom::TextStats;
pub use images::verify_images;
pub use render::markup_to_text;
pub use sanitize::strip_comments;
pub use scoring::{score, Candidate, MIN_CONTENT_SCORE, NOISE_WEIGHT};
pub use title::title_from_source;

use crate::config::ExtractConfig;
use dom::Analysis;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors raised by the extractor
///
/// A page without a good candidate is not an error; only input that cannot
/// be treated as HTML at all is.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("HTML parse error for {source_ref}: {message}")]
    Parse { source_ref: String, message: String },
}

/// Extraction switches
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    /// Return the description without any markup
    pub description_as_plain_text: bool,
    /// Prune elements without text or meaningful children before scoring
    pub remove_empty_nodes: bool,
    /// Bound for each image check
    pub image_request_timeout: Duration,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::from(&ExtractConfig::default())
    }
}

impl From<&ExtractConfig> for ExtractOptions {
    fn from(config: &ExtractConfig) -> Self {
        Self {
            description_as_plain_text: config.description_as_plain_text,
            remove_empty_nodes: config.remove_empty_nodes,
            image_request_timeout: Duration::from_millis(config.image_request_timeout_millis),
        }
    }
}

/// An image reference found while rendering markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// The `src` exactly as the page wrote it
    pub original: String,
    /// The reference made absolute against the source URL
    pub resolved: String,
}

/// Result of extracting one page
#[derive(Debug, Clone)]
pub struct Extracted {
    pub title: String,
    pub description: String,
    /// Images referenced by a marked-up description (empty for plain text)
    pub images: Vec<ImageRef>,
    /// True when no candidate qualified and the whole body was used
    pub used_fallback: bool,
}

/// Extracts title and description from a page
///
/// `html` should already be comment-free (see [`strip_comments`]); comment
/// nodes that survive are ignored anyway. `source` is the page URL or file
/// path, used to resolve relative references and as a last-resort title.
///
/// # Example
///
/// ```
/// use readengine::extract::{extract, ExtractOptions};
///
/// let html = "<html><head><title>T</title></head><body><nav>menu</nav>\
///             <article><p>Long real article sentence repeated for length.</p></article></body></html>";
/// let page = extract(html, "https://example.com/t", &ExtractOptions::default()).unwrap();
/// assert_eq!(page.title, "T");
/// assert!(page.description.contains("Long real article sentence"));
/// assert!(!page.description.contains("menu"));
/// ```
pub fn extract(html: &str, source: &str, options: &ExtractOptions) -> Result<Extracted, ExtractError> {
    if html.trim().is_empty() {
        return Err(ExtractError::Parse {
            source_ref: source.to_string(),
            message: "document is empty".to_string(),
        });
    }

    let document = Html::parse_document(html);
    if !document.errors.is_empty() {
        tracing::trace!(source, errors = document.errors.len(), "parsed with recoverable errors");
    }

    let root = document.root_element();
    let analysis = Analysis::new(root, options.remove_empty_nodes);
    let title = title::extract_title(&document, &analysis, source);

    let candidates = scoring::score_candidates(&analysis, root);
    let selected = scoring::select_main(&candidates);

    let (content_root, used_fallback) = match selected {
        Some(candidate) => {
            tracing::debug!(
                source,
                tag = candidate.element.value().name(),
                score = candidate.score,
                candidates = candidates.len(),
                "main content selected"
            );
            (candidate.element, false)
        }
        None => {
            tracing::debug!(source, "no candidate qualified, using whole body");
            (body_of(&document).unwrap_or(root), true)
        }
    };

    let (description, images) = if options.description_as_plain_text {
        (render::render_plain(&analysis, content_root), Vec::new())
    } else {
        let base = Url::parse(source).ok();
        render::render_markup(&analysis, content_root, base.as_ref())
    };

    Ok(Extracted {
        title,
        description,
        images,
        used_fallback,
    })
}

fn body_of(document: &Html) -> Option<ElementRef<'_>> {
    let selector = Selector::parse("body").ok()?;
    document.select(&selector).next()
}
