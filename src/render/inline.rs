//! Inline (text-level) Markdown substitutions
//!
//! Substitutions run in a fixed order: images, links, bold+italic, bold, italic,
//! then inline code. Every generated fragment is set aside behind a marker
//! before the next pass runs, so no pass ever matches inside HTML an earlier
//! pass produced (a `*` in a link target stays a `*`). Code spans are set aside
//! before any pass and emitted last, so their content is never formatted.
//!
//! Only inline code content and link/image targets are escaped. Plain prose is
//! inserted as-is.

use html_escape::{encode_double_quoted_attribute, encode_text};
use regex::{Captures, Regex};
use std::sync::LazyLock;

static IMAGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)\s]+)\)").unwrap());
static LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)\s]+)\)").unwrap());
static BOLD_ITALIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*\*([^*]+)\*\*\*").unwrap());
static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());
static ITALIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*([^*\s](?:[^*]*[^*\s])?)\*").unwrap());
static CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]+)`").unwrap());
static MARK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\x{E000}(\d+)\x{E001}").unwrap());

// Private-use characters; none of the patterns above can match them.
const MARK_OPEN: char = '\u{E000}';
const MARK_CLOSE: char = '\u{E001}';

/// Applies every inline substitution to `text`
pub fn format_inline(text: &str) -> String {
    let mut stash = Stash::default();
    let text = text.replace([MARK_OPEN, MARK_CLOSE], "\u{FFFD}");

    let out = CODE
        .replace_all(&text, |caps: &Captures| {
            stash.hold(&caps[0], format!("<code>{}</code>", encode_text(&caps[1])))
        })
        .into_owned();
    let out = IMAGE
        .replace_all(&out, |caps: &Captures| {
            let html = format!(
                r#"<img src="{}" alt="{}" loading="lazy">"#,
                encode_double_quoted_attribute(&stash.expand(&caps[2], View::Source)),
                encode_double_quoted_attribute(&stash.expand(&caps[1], View::Source)),
            );
            stash.hold(&caps[0], html)
        })
        .into_owned();
    let out = LINK
        .replace_all(&out, |caps: &Captures| {
            let label = emphasize(&caps[1], &mut stash);
            let html = format!(
                r#"<a href="{}" target="_blank" rel="noopener noreferrer">{}</a>"#,
                encode_double_quoted_attribute(&stash.expand(&caps[2], View::Source)),
                label,
            );
            stash.hold(&caps[0], html)
        })
        .into_owned();
    let out = emphasize(&out, &mut stash);

    stash.expand(&out, View::Html)
}

/// Bold+italic, bold, then italic
fn emphasize(text: &str, stash: &mut Stash) -> String {
    let out = BOLD_ITALIC
        .replace_all(text, |caps: &Captures| {
            stash.hold(&caps[0], format!("<strong><em>{}</em></strong>", &caps[1]))
        })
        .into_owned();
    let out = BOLD
        .replace_all(&out, |caps: &Captures| {
            stash.hold(&caps[0], format!("<strong>{}</strong>", &caps[1]))
        })
        .into_owned();
    italicize(&out, stash)
}

/// Wraps single-star spans in `<em>`, leaving spans that touch another `*` alone
fn italicize(text: &str, stash: &mut Stash) -> String {
    ITALIC
        .replace_all(text, |caps: &Captures| {
            let whole = caps.get(0).map_or(0..0, |m| m.range());
            let touches_star = text[..whole.start].ends_with('*') || text[whole.end..].starts_with('*');
            if touches_star {
                caps[0].to_string()
            } else {
                stash.hold(&caps[0], format!("<em>{}</em>", &caps[1]))
            }
        })
        .into_owned()
}

#[derive(Clone, Copy)]
enum View {
    /// The Markdown a fragment replaced
    Source,
    /// The HTML it produced
    Html,
}

/// Fragments already produced, referenced from the text by index
#[derive(Default)]
struct Stash {
    fragments: Vec<(String, String)>,
}

impl Stash {
    /// Stores a fragment and returns the marker that stands in for it
    fn hold(&mut self, source: &str, html: String) -> String {
        self.fragments.push((source.to_string(), html));
        format!("{MARK_OPEN}{}{MARK_CLOSE}", self.fragments.len() - 1)
    }

    /// Replaces every marker in `text`, recursing into nested fragments
    ///
    /// A fragment only ever contains markers of fragments stored before it.
    fn expand(&self, text: &str, view: View) -> String {
        MARK.replace_all(text, |caps: &Captures| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|index| self.fragments.get(index))
                .map(|(source, html)| match view {
                    View::Source => self.expand(source, view),
                    View::Html => self.expand(html, view),
                })
                .unwrap_or_default()
        })
        .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_unchanged() {
        assert_eq!(format_inline("just words"), "just words");
    }

    #[test]
    fn test_bold_italic_and_combined_spans() {
        let html = format_inline("**bold** and *italic* and ***both***");
        assert_eq!(
            html,
            "<strong>bold</strong> and <em>italic</em> and <strong><em>both</em></strong>"
        );
    }

    #[test]
    fn test_link_opens_in_new_context_with_safe_rel() {
        let html = format_inline("see [the docs](https://example.org/docs)");
        assert_eq!(
            html,
            r#"see <a href="https://example.org/docs" target="_blank" rel="noopener noreferrer">the docs</a>"#
        );
    }

    #[test]
    fn test_link_target_is_attribute_escaped() {
        let html = format_inline(r#"[x](https://e.org/?a="b")"#);
        assert!(html.contains("href=\"https://e.org/?a=&quot;b&quot;\""), "{}", html);
    }

    #[test]
    fn test_stars_in_link_target_are_kept() {
        let html = format_inline("[docs](https://e.org/a*b*c)");
        assert_eq!(
            html,
            r#"<a href="https://e.org/a*b*c" target="_blank" rel="noopener noreferrer">docs</a>"#
        );
    }

    #[test]
    fn test_backticks_in_link_target_are_kept() {
        let html = format_inline("[x](https://e.org/`q`)");
        assert_eq!(
            html,
            r#"<a href="https://e.org/`q`" target="_blank" rel="noopener noreferrer">x</a>"#
        );
    }

    #[test]
    fn test_link_label_is_emphasized() {
        let html = format_inline("[*new* docs](https://e.org)");
        assert_eq!(
            html,
            r#"<a href="https://e.org" target="_blank" rel="noopener noreferrer"><em>new</em> docs</a>"#
        );
    }

    #[test]
    fn test_image_has_lazy_loading_and_is_not_a_link() {
        let html = format_inline("![Screenshot](shot.png)");
        assert_eq!(html, r#"<img src="shot.png" alt="Screenshot" loading="lazy">"#);
        assert!(!html.contains("<a "));
    }

    #[test]
    fn test_stars_in_image_alt_are_kept() {
        let html = format_inline("![a *b* c](x.png)");
        assert_eq!(html, r#"<img src="x.png" alt="a *b* c" loading="lazy">"#);
    }

    #[test]
    fn test_image_inside_link() {
        let html = format_inline("[![logo](logo.png)](https://e.org)");
        assert_eq!(
            html,
            r#"<a href="https://e.org" target="_blank" rel="noopener noreferrer"><img src="logo.png" alt="logo" loading="lazy"></a>"#
        );
    }

    #[test]
    fn test_inline_code_content_is_escaped() {
        let html = format_inline("run `a < b && c`");
        assert_eq!(html, "run <code>a &lt; b &amp;&amp; c</code>");
    }

    #[test]
    fn test_code_span_content_is_not_formatted() {
        assert_eq!(format_inline("`**x**`"), "<code>**x**</code>");
        assert_eq!(format_inline("`[a](b)`"), "<code>[a](b)</code>");
    }

    #[test]
    fn test_star_next_to_star_is_not_italic() {
        assert_eq!(format_inline("**x*"), "**x*");
    }

    #[test]
    fn test_lone_stars_with_spaces_are_not_italic() {
        assert_eq!(format_inline("2 * 3 * 4"), "2 * 3 * 4");
    }

    #[test]
    fn test_italic_cannot_close_after_whitespace() {
        assert_eq!(format_inline("*a *"), "*a *");
        assert_eq!(format_inline("*a*"), "<em>a</em>");
        assert_eq!(format_inline("*a b*"), "<em>a b</em>");
    }

    #[test]
    fn test_marker_characters_in_input_are_replaced() {
        assert_eq!(format_inline("a\u{E000}0\u{E001}b"), "a\u{FFFD}0\u{FFFD}b");
    }

    #[test]
    fn test_prose_html_passes_through_unescaped() {
        assert_eq!(format_inline("a <b>tag</b>"), "a <b>tag</b>");
    }
}
