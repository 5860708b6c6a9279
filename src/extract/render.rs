//! Rendering of the selected subtree into the document description

use crate::extract::dom::{collapse_whitespace, is_block, Analysis, Step};
use crate::extract::ImageRef;
use scraper::{ElementRef, Html};
use url::Url;

/// Tags kept verbatim (without attributes) in marked-up output
const SAFE_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li", "blockquote", "pre", "code", "em",
    "strong", "b", "i",
];

/// Renders `root` as plain text, one paragraph per block element
pub fn render_plain(analysis: &Analysis, root: ElementRef<'_>) -> String {
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();

    for step in analysis.walk(root) {
        match step {
            Step::Text(text) => current.push_str(text),
            Step::Open(element) | Step::Close(element) => {
                let name = element.value().name();
                if name == "br" || is_block(name) {
                    flush_paragraph(&mut current, &mut paragraphs);
                }
            }
        }
    }
    flush_paragraph(&mut current, &mut paragraphs);
    paragraphs.join("\n\n")
}

fn flush_paragraph(current: &mut String, paragraphs: &mut Vec<String>) {
    let paragraph = collapse_whitespace(current);
    if !paragraph.is_empty() {
        paragraphs.push(paragraph);
    }
    current.clear();
}

/// Visible text of a marked-up description, as [`render_plain`] lays it out
pub fn markup_to_text(markup: &str) -> String {
    let fragment = Html::parse_fragment(markup);
    let root = fragment.root_element();
    render_plain(&Analysis::new(root, false), root)
}

/// Renders `root` as minimal HTML
///
/// Only [`SAFE_TAGS`], `br`, `a[href]` and `img[src]` survive, without any
/// other attribute; text is escaped. Links and images are made absolute
/// against `base` when it is known, and every image is reported so it can
/// be checked later.
pub fn render_markup(analysis: &Analysis, root: ElementRef<'_>, base: Option<&Url>) -> (String, Vec<ImageRef>) {
    let mut writer = MarkupWriter {
        base,
        out: String::new(),
        images: Vec::new(),
        closers: Vec::new(),
    };
    for step in analysis.walk(root) {
        match step {
            Step::Text(text) => writer.out.push_str(&escape_text(text)),
            Step::Open(element) => writer.open(element),
            Step::Close(_) => {
                if let Some(Some(closer)) = writer.closers.pop() {
                    writer.out.push_str(&closer);
                }
            }
        }
    }
    (writer.out.trim().to_string(), writer.images)
}

struct MarkupWriter<'b> {
    base: Option<&'b Url>,
    out: String,
    images: Vec<ImageRef>,
    /// What to emit when each open element closes
    closers: Vec<Option<String>>,
}

impl MarkupWriter<'_> {
    fn open(&mut self, element: ElementRef<'_>) {
        let name = element.value().name();
        let closer = match name {
            "br" => {
                self.out.push_str("<br>");
                None
            }
            "img" => {
                if let Some(src) = element.value().attr("src").map(str::trim).filter(|s| !s.is_empty()) {
                    let resolved = self.resolve(src).unwrap_or_else(|| src.to_string());
                    self.out.push_str(&img_tag(&resolved));
                    self.images.push(ImageRef {
                        original: src.to_string(),
                        resolved,
                    });
                }
                None
            }
            "a" => element
                .value()
                .attr("href")
                .and_then(|href| self.resolve_link(href))
                .map(|href| {
                    self.out.push_str(&format!("<a href=\"{}\">", escape_attr(&href)));
                    "</a>".to_string()
                }),
            _ if SAFE_TAGS.contains(&name) => {
                self.out.push_str(&format!("<{}>", name));
                Some(format!("</{}>", name))
            }
            _ => is_block(name).then(|| "\n".to_string()),
        };
        self.closers.push(closer);
    }

    fn resolve(&self, reference: &str) -> Option<String> {
        self.base
            .and_then(|base| base.join(reference).ok())
            .map(|url| url.to_string())
    }

    /// Links keep only http(s) targets
    fn resolve_link(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') {
            return None;
        }
        let resolved = match self.base {
            Some(base) => base.join(href).ok()?,
            None => Url::parse(href).ok()?,
        };
        matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
    }
}

/// The `<img>` tag emitted for an image source
pub(crate) fn img_tag(src: &str) -> String {
    format!("<img src=\"{}\">", escape_attr(src))
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}
