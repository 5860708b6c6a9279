//! Readability-style scoring of block candidates
//!
//! `score = text_len - link_penalty - tag_noise_penalty`, where the link
//! penalty is the share of the text sitting inside anchors and the noise
//! penalty grows with every non-prose element below the candidate.

use crate::extract::dom::{is_candidate, Analysis, Step, TextStats};
use scraper::ElementRef;

/// Penalty, in characters, for each non-prose element below a candidate
pub const NOISE_WEIGHT: f64 = 10.0;

/// A candidate scoring below this is not considered main content
pub const MIN_CONTENT_SCORE: f64 = 25.0;

/// A scored block element
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub element: ElementRef<'a>,
    pub stats: TextStats,
    pub score: f64,
    /// Position in document order
    pub position: usize,
}

/// Scores a subtree from its text measurements
pub fn score(stats: &TextStats) -> f64 {
    let text_len = stats.chars as f64;
    let link_penalty = text_len * stats.link_density();
    let noise_penalty = NOISE_WEIGHT * stats.noise_tags as f64;
    text_len - link_penalty - noise_penalty
}

/// Collects and scores every candidate below `root`, in document order
///
/// Subtrees the analysis skips (boilerplate, and empty subtrees when
/// pruning) are not descended into.
pub fn score_candidates<'a>(analysis: &Analysis, root: ElementRef<'a>) -> Vec<Candidate<'a>> {
    let mut candidates = Vec::new();
    for step in analysis.walk(root) {
        let Step::Open(element) = step else {
            continue;
        };
        if is_candidate(element.value().name()) {
            let stats = analysis.measure(element);
            candidates.push(Candidate {
                element,
                stats,
                score: score(&stats),
                position: candidates.len(),
            });
        }
    }
    candidates
}

/// Picks the highest-scoring candidate; ties go to the earliest one
///
/// Returns `None` when nothing reaches [`MIN_CONTENT_SCORE`].
pub fn select_main<'a>(candidates: &[Candidate<'a>]) -> Option<Candidate<'a>> {
    let mut best: Option<Candidate<'a>> = None;
    for candidate in candidates {
        if best.map_or(true, |current| candidate.score > current.score) {
            best = Some(*candidate);
        }
    }
    best.filter(|c| c.score >= MIN_CONTENT_SCORE)
}
