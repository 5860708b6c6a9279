//! Title derivation

use crate::extract::dom::{collapsed_text, Analysis, Step};
use crate::extract::scoring::score;
use scraper::{Html, Selector};
use std::path::Path;
use url::Url;

/// Derives the document title
///
/// Order of preference:
/// 1. the `<title>` element
/// 2. the best-scoring `h1`-`h3` outside boilerplate
/// 3. the last non-empty path segment of the source URL, or the file stem
/// 4. the source itself
pub fn extract_title(document: &Html, analysis: &Analysis, source: &str) -> String {
    title_element(document)
        .or_else(|| best_heading(document, analysis))
        .or_else(|| title_from_source(source))
        .unwrap_or_else(|| source.trim().to_string())
}

fn title_element(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(collapsed_text)
        .filter(|s| !s.is_empty())
}

fn best_heading(document: &Html, analysis: &Analysis) -> Option<String> {
    let mut best = None;
    let mut best_score = f64::NEG_INFINITY;

    for step in analysis.walk(document.root_element()) {
        let Step::Open(heading) = step else {
            continue;
        };
        if !matches!(heading.value().name(), "h1" | "h2" | "h3") {
            continue;
        }
        let stats = analysis.measure(heading);
        if stats.chars == 0 {
            continue;
        }
        let heading_score = score(&stats);
        if best.is_none() || heading_score > best_score {
            best = Some(heading);
            best_score = heading_score;
        }
    }

    best.map(collapsed_text)
}

/// Last non-empty URL path segment, or the file stem of a local path
pub fn title_from_source(source: &str) -> Option<String> {
    let source = source.trim();
    if let Ok(url) = Url::parse(source) {
        if url.scheme() == "http" || url.scheme() == "https" {
            return url
                .path_segments()
                .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
                .map(|s| s.to_string());
        }
    }

    Path::new(source)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
}
