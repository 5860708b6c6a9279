//! Tag classification and text measurement over the parsed tree
//!
//! Emptiness and text statistics are computed once per element, bottom-up,
//! by [`Analysis`]. Every later question (is this subtree pruned, how much
//! text does this candidate hold) is a lookup, and tree walks use explicit
//! traversal instead of recursion, so deeply nested pages cost linear time
//! and constant stack.

use ego_tree::iter::{Edge, Traverse};
use ego_tree::NodeId;
use scraper::{ElementRef, Node};
use std::collections::HashMap;

/// Elements that never contribute to content: navigation, scripts, forms
pub const BOILERPLATE_TAGS: &[&str] = &[
    "nav", "header", "footer", "aside", "script", "style", "noscript", "form", "input", "button",
    "select", "textarea", "iframe", "svg", "template", "object", "embed", "head", "link", "meta",
];

/// Elements considered when looking for the main-content root
pub const CANDIDATE_TAGS: &[&str] = &[
    "article", "main", "section", "div", "td", "blockquote", "pre", "p",
];

/// Prose and inline elements; they add no tag noise to a candidate
const PROSE_TAGS: &[&str] = &[
    "p", "span", "a", "em", "strong", "b", "i", "u", "code", "br", "sub", "sup", "small", "mark",
    "abbr", "cite", "q", "time", "font", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6",
    "img", "figure", "figcaption", "pre", "blockquote", "dl", "dt", "dd",
];

/// Elements rendered as separate paragraphs in plain text
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "section", "article", "main", "h1", "h2", "h3", "h4", "h5", "h6", "li", "ul",
    "ol", "blockquote", "pre", "table", "tr", "td", "th", "figure", "figcaption", "dl", "dt",
    "dd", "hr", "body",
];

/// Leaf elements that carry meaning without text
const MEANINGFUL_EMPTY_TAGS: &[&str] = &["img", "br", "hr"];

pub fn is_boilerplate(name: &str) -> bool {
    BOILERPLATE_TAGS.contains(&name)
}

pub fn is_candidate(name: &str) -> bool {
    CANDIDATE_TAGS.contains(&name)
}

pub fn is_prose(name: &str) -> bool {
    PROSE_TAGS.contains(&name)
}

pub fn is_block(name: &str) -> bool {
    BLOCK_TAGS.contains(&name)
}

/// Text measurements of a subtree
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextStats {
    /// Non-whitespace characters of visible text
    pub chars: usize,
    /// Characters of that text enclosed in anchors
    pub link_chars: usize,
    /// Descendant elements that are neither prose nor inline
    pub noise_tags: usize,
}

impl TextStats {
    /// Fraction of the text that sits inside links
    pub fn link_density(&self) -> f64 {
        if self.chars == 0 {
            0.0
        } else {
            self.link_chars as f64 / self.chars as f64
        }
    }

    fn add(&mut self, other: &TextStats) {
        self.chars += other.chars;
        self.link_chars += other.link_chars;
        self.noise_tags += other.noise_tags;
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Facts {
    /// Some non-whitespace text below, pruned subtrees included
    has_text: bool,
    /// Some `img` below
    has_image: bool,
    empty: bool,
    skipped: bool,
    /// Visible text below, pruned subtrees excluded
    stats: TextStats,
}

/// Per-element facts for one parsed tree
///
/// An element is *empty* when it has no visible text and no image below it
/// (`img`, `br` and `hr` themselves are never empty). It is *skipped* when it
/// is boilerplate, or empty while `remove_empty_nodes` is set. Skipped
/// subtrees contribute nothing to measurements or rendering.
pub struct Analysis {
    facts: HashMap<NodeId, Facts>,
}

impl Analysis {
    /// Analyzes every element below and including `root`
    pub fn new(root: ElementRef<'_>, remove_empty_nodes: bool) -> Self {
        let mut facts: HashMap<NodeId, Facts> = HashMap::new();

        // Post-order: every child is closed, and thus known, before its parent
        for edge in root.traverse() {
            let Edge::Close(node) = edge else {
                continue;
            };
            let Some(element) = ElementRef::wrap(node) else {
                continue;
            };

            let mut own = Facts::default();
            for child in node.children() {
                match child.value() {
                    Node::Text(text) => {
                        let n = text.chars().filter(|c| !c.is_whitespace()).count();
                        own.has_text |= n > 0;
                        own.stats.chars += n;
                    }
                    Node::Element(e) => {
                        let Some(child_facts) = facts.get(&child.id()) else {
                            continue;
                        };
                        let name = e.name();
                        own.has_text |= child_facts.has_text;
                        own.has_image |= child_facts.has_image || name == "img";
                        if child_facts.skipped {
                            continue;
                        }
                        if !is_prose(name) {
                            own.stats.noise_tags += 1;
                        }
                        let mut child_stats = child_facts.stats;
                        if name == "a" {
                            child_stats.link_chars = child_stats.chars;
                        }
                        own.stats.add(&child_stats);
                    }
                    _ => {}
                }
            }

            let name = element.value().name();
            own.empty = !MEANINGFUL_EMPTY_TAGS.contains(&name) && !own.has_text && !own.has_image;
            own.skipped = is_boilerplate(name) || (remove_empty_nodes && own.empty);
            facts.insert(node.id(), own);
        }

        Self { facts }
    }

    fn facts(&self, element: ElementRef<'_>) -> Facts {
        self.facts.get(&element.id()).copied().unwrap_or_default()
    }

    /// Returns true if the element has no visible text and no image below it
    pub fn is_empty(&self, element: ElementRef<'_>) -> bool {
        self.facts(element).empty
    }

    /// Returns true if `element` should be skipped entirely while walking
    pub fn is_skipped(&self, element: ElementRef<'_>) -> bool {
        self.facts(element).skipped
    }

    /// Measures the visible text below `element`
    ///
    /// Boilerplate subtrees and comments are ignored; empty elements are
    /// ignored too when the analysis prunes them.
    pub fn measure(&self, element: ElementRef<'_>) -> TextStats {
        self.facts(element).stats
    }

    /// Walks the descendants of `root` in document order
    ///
    /// Skipped subtrees are left out entirely; comments are not reported.
    pub fn walk<'a>(&self, root: ElementRef<'a>) -> Walk<'a, '_> {
        Walk {
            analysis: self,
            root: root.id(),
            edges: root.traverse(),
            skipping: None,
        }
    }
}

/// One step of a [`Walk`]
#[derive(Debug, Clone, Copy)]
pub enum Step<'a> {
    Text(&'a str),
    Open(ElementRef<'a>),
    Close(ElementRef<'a>),
}

/// Pruned document-order traversal, see [`Analysis::walk`]
pub struct Walk<'a, 'b> {
    analysis: &'b Analysis,
    root: NodeId,
    edges: Traverse<'a, Node>,
    /// Root of the skipped subtree currently being passed over
    skipping: Option<NodeId>,
}

impl<'a> Iterator for Walk<'a, '_> {
    type Item = Step<'a>;

    fn next(&mut self) -> Option<Step<'a>> {
        for edge in self.edges.by_ref() {
            match edge {
                Edge::Open(node) => {
                    if self.skipping.is_some() || node.id() == self.root {
                        continue;
                    }
                    match node.value() {
                        Node::Text(text) => return Some(Step::Text(text)),
                        Node::Element(_) => {
                            let Some(element) = ElementRef::wrap(node) else {
                                continue;
                            };
                            if self.analysis.is_skipped(element) {
                                self.skipping = Some(node.id());
                                continue;
                            }
                            return Some(Step::Open(element));
                        }
                        _ => {}
                    }
                }
                Edge::Close(node) => {
                    if node.id() == self.root {
                        return None;
                    }
                    if let Some(skipped) = self.skipping {
                        if skipped == node.id() {
                            self.skipping = None;
                        }
                        continue;
                    }
                    if let Some(element) = ElementRef::wrap(node) {
                        return Some(Step::Close(element));
                    }
                }
            }
        }
        None
    }
}

/// Visible text of `element` with whitespace collapsed
pub fn collapsed_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

/// Collapses runs of whitespace into single spaces and trims the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
