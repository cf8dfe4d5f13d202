//! Markdown to HTML rendering
//!
//! Renders the restricted Markdown dialect used by the documentation pages:
//! fenced code, rules, headings, pipe tables, blockquotes, flat lists and
//! paragraphs, plus inline images, links, emphasis and code spans.
//!
//! [`render`] never fails. If the line walk reports a [`ParseError`], the raw
//! source is returned escaped inside a `<pre>` block instead.

mod block;
mod inline;

pub use block::{Block, ParseError};
pub use inline::format_inline;

use tracing::warn;

/// Converts `\r\n` and lone `\r` line endings to `\n`
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Parses `markdown` into blocks, reporting walk errors
pub fn parse_blocks(markdown: &str) -> Result<Vec<Block>, ParseError> {
    let normalized = normalize_line_endings(markdown);
    let lines: Vec<&str> = normalized.split('\n').collect();
    block::parse(&lines)
}

/// Renders `markdown` to HTML, reporting walk errors instead of falling back
pub fn try_render(markdown: &str) -> Result<String, ParseError> {
    let blocks = parse_blocks(markdown)?;
    Ok(blocks.iter().map(Block::to_html).collect::<Vec<_>>().join("\n"))
}

/// Renders `markdown` to an HTML fragment
///
/// Pure and deterministic. On a parse error the escaped source is returned in a
/// whitespace-preserving block.
pub fn render(markdown: &str) -> String {
    try_render(markdown).unwrap_or_else(|e| {
        warn!("Markdown parse failed, showing raw source: {}", e);
        fallback_html(markdown)
    })
}

/// Escaped raw source wrapped in `<pre>`
pub fn fallback_html(markdown: &str) -> String {
    Block::Fallback(normalize_line_endings(markdown)).to_html()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "# Install\n\nGet the **latest** build:\n\n```sh\ncurl -L https://example.org | sh\n```\n\n| OS | Package |\n|----|---------|\n| Linux | `tar.gz` |\n\n> Needs *GTK 4*\n\n- fast\n- small\n\n---\n\n1. download\n2. run\n";

    #[test]
    fn test_render_is_deterministic() {
        assert_eq!(render(DOC), render(DOC));
    }

    #[test]
    fn test_render_full_document() {
        let html = render(DOC);
        let expected = [
            "<h1>Install</h1>",
            "<p>Get the <strong>latest</strong> build:</p>",
            "<pre><code>curl -L https://example.org | sh</code></pre>",
            "<table><thead><tr><th>OS</th><th>Package</th></tr></thead><tbody><tr><td>Linux</td><td><code>tar.gz</code></td></tr></tbody></table>",
            "<blockquote><p>Needs <em>GTK 4</em></p></blockquote>",
            "<ul><li>fast</li><li>small</li></ul>",
            "<hr>",
            "<ol><li>download</li><li>run</li></ol>",
        ]
        .join("\n");
        assert_eq!(html, expected);
    }

    #[test]
    fn test_heading_levels_render() {
        assert_eq!(render("# Title"), "<h1>Title</h1>");
        assert_eq!(render("###### Title"), "<h6>Title</h6>");
    }

    #[test]
    fn test_fenced_script_is_escaped() {
        let html = render("```html\n<script>alert(1)</script>\n```");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    }

    #[test]
    fn test_emphasis_line() {
        assert_eq!(
            render("**bold** and *italic* and ***both***"),
            "<p><strong>bold</strong> and <em>italic</em> and <strong><em>both</em></strong></p>"
        );
    }

    #[test]
    fn test_table_row_and_cell_counts() {
        let html = render("| a | b | c |\n|---|---|---|\n| 1 | 2 | 3 |\n| 4 | 5 | 6 |");
        assert_eq!(html.matches("<thead><tr>").count(), 1);
        assert_eq!(html.matches("<th>").count(), 3);
        assert_eq!(html.matches("<tbody>").count(), 1);
        assert_eq!(html.matches("<tr>").count(), 3);
        assert_eq!(html.matches("<td>").count(), 6);
    }

    #[test]
    fn test_malformed_table_separator_renders_paragraph() {
        let html = render("| a | b |\n| -x- | --- |\n| 1 | 2 |");
        assert!(!html.contains("<table>"));
        assert!(html.starts_with("<p>| a | b |<br>"));
    }

    #[test]
    fn test_paragraph_lines_joined_with_br() {
        assert_eq!(render("one\r\ntwo\rthree"), "<p>one<br>two<br>three</p>");
    }

    #[test]
    fn test_empty_input_renders_nothing() {
        assert_eq!(render(""), "");
        assert_eq!(render("\n\n"), "");
    }

    #[test]
    fn test_prose_angle_brackets_are_not_escaped() {
        assert_eq!(render("a <kbd>Ctrl</kbd> b"), "<p>a <kbd>Ctrl</kbd> b</p>");
    }

    #[test]
    fn test_fallback_escapes_and_preserves_whitespace() {
        assert_eq!(
            fallback_html("<b>x</b>\r\n  y"),
            "<pre>&lt;b&gt;x&lt;/b&gt;\n  y</pre>"
        );
    }
}
