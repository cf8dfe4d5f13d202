//! Block-level parsing
//!
//! A cursor walks the normalized lines. At each position the matchers in
//! [`MATCHERS`] are tried in priority order; the first one that applies
//! reports the block it produced and how many lines it consumed.

use html_escape::encode_text;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

use super::inline::format_inline;

static FENCE_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^```\s*[\w+#.-]*\s*$").unwrap());
static FENCE_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^```\s*$").unwrap());
static RULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:-[ \t]*){3,}|(?:_[ \t]*){3,}|(?:\*[ \t]*){3,})$").unwrap()
});
static HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+)$").unwrap());
static TABLE_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\|?\s*:?-+:?\s*(?:\|\s*:?-+:?\s*)*\|?$").unwrap()
});
static UNORDERED_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*[-*+]\s+(.*)$").unwrap());
static ORDERED_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\d+\.\s+(.*)$").unwrap());

/// One parsed block of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// `<h1>`..`<h6>` with inline-formatted text
    Heading { level: usize, text: String },
    /// Lines joined by `<br>`
    Paragraph(Vec<String>),
    /// Raw lines of a fenced code block
    Code(Vec<String>),
    /// Horizontal rule
    Rule,
    /// Header cells and body rows
    Table {
        header: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// Quoted lines already joined by single spaces
    Quote(String),
    UnorderedList(Vec<String>),
    OrderedList(Vec<String>),
    /// Raw source shown verbatim when parsing fails
    Fallback(String),
}

impl Block {
    /// Renders this block to an HTML fragment
    pub fn to_html(&self) -> String {
        match self {
            Block::Heading { level, text } => {
                format!("<h{level}>{}</h{level}>", format_inline(text))
            }
            Block::Paragraph(lines) => {
                let formatted: Vec<String> = lines.iter().map(|l| format_inline(l)).collect();
                format!("<p>{}</p>", formatted.join("<br>"))
            }
            Block::Code(lines) => {
                format!("<pre><code>{}</code></pre>", encode_text(&lines.join("\n")))
            }
            Block::Rule => "<hr>".to_string(),
            Block::Table { header, rows } => {
                let mut html = String::from("<table><thead><tr>");
                for cell in header {
                    html.push_str(&format!("<th>{}</th>", format_inline(cell)));
                }
                html.push_str("</tr></thead><tbody>");
                for row in rows {
                    html.push_str("<tr>");
                    for cell in row {
                        html.push_str(&format!("<td>{}</td>", format_inline(cell)));
                    }
                    html.push_str("</tr>");
                }
                html.push_str("</tbody></table>");
                html
            }
            Block::Quote(text) => {
                format!("<blockquote><p>{}</p></blockquote>", format_inline(text))
            }
            Block::UnorderedList(items) => list_html("ul", items),
            Block::OrderedList(items) => list_html("ol", items),
            Block::Fallback(raw) => format!("<pre>{}</pre>", encode_text(raw)),
        }
    }
}

fn list_html(tag: &str, items: &[String]) -> String {
    let items: String = items
        .iter()
        .map(|item| format!("<li>{}</li>", format_inline(item)))
        .collect();
    format!("<{tag}>{items}</{tag}>")
}

/// Errors raised when the line walk breaks its own invariants
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// A matcher claimed a match but consumed no lines
    #[error("matcher '{matcher}' made no progress at line {line}")]
    NoProgress { matcher: &'static str, line: usize },

    /// A matcher consumed lines past the end of the input
    #[error("matcher '{matcher}' consumed past end of input at line {line}")]
    Overrun { matcher: &'static str, line: usize },

    /// No matcher accepted the line
    #[error("no matcher accepted line {line}")]
    Unmatched { line: usize },
}

/// Result of a successful matcher: the block produced (if any) and lines consumed
#[derive(Debug)]
pub struct Consumed {
    pub block: Option<Block>,
    pub lines: usize,
}

impl Consumed {
    fn block(block: Block, lines: usize) -> Self {
        Self {
            block: Some(block),
            lines,
        }
    }
}

/// A block matcher tried at cursor position `i`
pub struct Matcher {
    pub name: &'static str,
    pub try_match: fn(&[&str], usize) -> Option<Consumed>,
}

/// Matchers in priority order
pub const MATCHERS: &[Matcher] = &[
    Matcher { name: "fenced-code", try_match: fenced_code },
    Matcher { name: "rule", try_match: horizontal_rule },
    Matcher { name: "heading", try_match: heading },
    Matcher { name: "table", try_match: table },
    Matcher { name: "blockquote", try_match: blockquote },
    Matcher { name: "unordered-list", try_match: unordered_list },
    Matcher { name: "ordered-list", try_match: ordered_list },
    Matcher { name: "blank", try_match: blank },
    Matcher { name: "paragraph", try_match: paragraph },
];

/// Matchers whose match ends a running paragraph (everything before "paragraph")
const BLOCK_STARTERS: &[Matcher] = MATCHERS.split_at(MATCHERS.len() - 1).0;

/// Walks `lines` with the given matchers, collecting blocks in source order
pub fn parse_with(lines: &[&str], matchers: &[Matcher]) -> Result<Vec<Block>, ParseError> {
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let (name, consumed) = matchers
            .iter()
            .find_map(|m| (m.try_match)(lines, i).map(|c| (m.name, c)))
            .ok_or(ParseError::Unmatched { line: i })?;

        if consumed.lines == 0 {
            return Err(ParseError::NoProgress { matcher: name, line: i });
        }
        if i + consumed.lines > lines.len() {
            return Err(ParseError::Overrun { matcher: name, line: i });
        }

        blocks.extend(consumed.block);
        i += consumed.lines;
    }

    Ok(blocks)
}

/// Walks `lines` with the standard matcher list
pub fn parse(lines: &[&str]) -> Result<Vec<Block>, ParseError> {
    parse_with(lines, MATCHERS)
}

fn fenced_code(lines: &[&str], i: usize) -> Option<Consumed> {
    if !FENCE_OPEN.is_match(lines[i].trim()) {
        return None;
    }

    let body_start = i + 1;
    let close = lines[body_start..]
        .iter()
        .position(|l| FENCE_CLOSE.is_match(l.trim()));

    // Unterminated fences take the rest of the document as code.
    let (body_end, consumed) = match close {
        Some(offset) => (body_start + offset, offset + 2),
        None => (lines.len(), lines.len() - i),
    };

    let code = lines[body_start..body_end].iter().map(|l| l.to_string()).collect();
    Some(Consumed::block(Block::Code(code), consumed))
}

fn horizontal_rule(lines: &[&str], i: usize) -> Option<Consumed> {
    RULE.is_match(lines[i].trim())
        .then(|| Consumed::block(Block::Rule, 1))
}

fn heading(lines: &[&str], i: usize) -> Option<Consumed> {
    let caps = HEADING.captures(lines[i])?;
    Some(Consumed::block(
        Block::Heading {
            level: caps[1].len(),
            text: caps[2].trim().to_string(),
        },
        1,
    ))
}

fn is_table_separator(line: &str) -> bool {
    let line = line.trim();
    line.contains('|') && TABLE_SEPARATOR.is_match(line)
}

fn split_row(line: &str) -> Vec<String> {
    let line = line.trim();
    let line = line.strip_prefix('|').unwrap_or(line);
    let line = line.strip_suffix('|').unwrap_or(line);
    line.split('|').map(|cell| cell.trim().to_string()).collect()
}

fn table(lines: &[&str], i: usize) -> Option<Consumed> {
    let next = lines.get(i + 1)?;
    if !lines[i].contains('|') || !is_table_separator(next) {
        return None;
    }

    let header = split_row(lines[i])
        .into_iter()
        .filter(|cell| !cell.is_empty())
        .collect();

    let rows: Vec<Vec<String>> = lines[i + 2..]
        .iter()
        .take_while(|l| !l.trim().is_empty() && l.contains('|'))
        .map(|l| split_row(l))
        .collect();

    let consumed = 2 + rows.len();
    Some(Consumed::block(Block::Table { header, rows }, consumed))
}

fn blockquote(lines: &[&str], i: usize) -> Option<Consumed> {
    let quoted: Vec<&str> = lines[i..]
        .iter()
        .map_while(|l| l.trim_start().strip_prefix('>'))
        .map(str::trim)
        .collect();

    if quoted.is_empty() {
        return None;
    }
    Some(Consumed::block(Block::Quote(quoted.join(" ")), quoted.len()))
}

fn list_items(lines: &[&str], i: usize, pattern: &Regex) -> Vec<String> {
    lines[i..]
        .iter()
        .map_while(|l| pattern.captures(l).map(|caps| caps[1].trim().to_string()))
        .collect()
}

fn unordered_list(lines: &[&str], i: usize) -> Option<Consumed> {
    let items = list_items(lines, i, &UNORDERED_ITEM);
    if items.is_empty() {
        return None;
    }
    let n = items.len();
    Some(Consumed::block(Block::UnorderedList(items), n))
}

fn ordered_list(lines: &[&str], i: usize) -> Option<Consumed> {
    let items = list_items(lines, i, &ORDERED_ITEM);
    if items.is_empty() {
        return None;
    }
    let n = items.len();
    Some(Consumed::block(Block::OrderedList(items), n))
}

fn blank(lines: &[&str], i: usize) -> Option<Consumed> {
    lines[i].trim().is_empty().then_some(Consumed { block: None, lines: 1 })
}

fn starts_block(lines: &[&str], i: usize) -> bool {
    BLOCK_STARTERS.iter().any(|m| (m.try_match)(lines, i).is_some())
}

fn paragraph(lines: &[&str], i: usize) -> Option<Consumed> {
    let mut end = i + 1;
    while end < lines.len() && !starts_block(lines, end) {
        end += 1;
    }
    let text = lines[i..end].iter().map(|l| l.trim().to_string()).collect();
    Some(Consumed::block(Block::Paragraph(text), end - i))
}
