//! Comment removal ahead of structural parsing

use std::borrow::Cow;

const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";

/// Removes every `<!-- ... -->` block from raw HTML
///
/// Each comment ends at the first `-->` after its own opening, so text
/// between two comments on the same line is preserved. `<!-->` and
/// `<!--->` are treated as empty comments, as an HTML parser would.
/// An opening with no closing marker is left in place for the parser,
/// whose comment nodes the extractor ignores anyway.
///
/// # Example
///
/// ```
/// use readengine::extract::strip_comments;
///
/// let html = "<p>a<!-- one -->b<!-- two -->c</p>";
/// assert_eq!(strip_comments(html), "<p>abc</p>");
/// ```
pub fn strip_comments(html: &str) -> Cow<'_, str> {
    if !html.contains(COMMENT_OPEN) {
        return Cow::Borrowed(html);
    }

    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(start) = rest.find(COMMENT_OPEN) {
        let body = &rest[start + COMMENT_OPEN.len()..];

        let consumed = if let Some(after) = body.strip_prefix('>') {
            after
        } else if let Some(after) = body.strip_prefix("->") {
            after
        } else if let Some(end) = body.find(COMMENT_CLOSE) {
            &body[end + COMMENT_CLOSE.len()..]
        } else {
            // unterminated: keep the tail untouched
            break;
        };

        out.push_str(&rest[..start]);
        rest = consumed;
    }

    out.push_str(rest);
    Cow::Owned(out)
}
