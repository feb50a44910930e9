//! Bot text to HTML
//!
//! Bubble text is plain text with two conventions: lines starting with
//! `• ` form a bullet list, and e-mail addresses or phone numbers become
//! copy-to-clipboard buttons. Everything else is escaped.

use regex::Regex;
use std::fmt::Write as _;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("valid email regex")
});
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+?\d(?:[\s().-]*\d){6,}").expect("valid phone regex"));

const BULLET: &str = "• ";

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

enum Block<'a> {
    Line(&'a str),
    List(Vec<&'a str>),
}

fn blocks(text: &str) -> Vec<Block<'_>> {
    let mut blocks: Vec<Block<'_>> = Vec::new();
    for line in text.split('\n') {
        let Some(item) = line.strip_prefix(BULLET) else {
            blocks.push(Block::Line(line));
            continue;
        };
        if let Some(Block::List(items)) = blocks.last_mut() {
            items.push(item);
        } else {
            blocks.push(Block::List(vec![item]));
        }
    }
    blocks
}

/// Render bubble text as HTML
pub fn to_markup(text: &str) -> String {
    let mut out = String::new();
    let mut after_line = false;
    for block in blocks(text) {
        match block {
            Block::Line(line) => {
                if after_line {
                    out.push_str("<br>");
                }
                out.push_str(&with_copy_controls(line));
                after_line = true;
            }
            Block::List(items) => {
                out.push_str("<ul>");
                for item in items {
                    let _ = write!(out, "<li>{}</li>", with_copy_controls(item));
                }
                out.push_str("</ul>");
                after_line = false;
            }
        }
    }
    out
}

/// Byte ranges of e-mail addresses and phone numbers, in order.
/// Phone matches inside an address are dropped.
pub fn copy_targets(line: &str) -> Vec<(usize, usize)> {
    let mut targets: Vec<(usize, usize)> = EMAIL_RE
        .find_iter(line)
        .map(|m| (m.start(), m.end()))
        .collect();
    let phones: Vec<(usize, usize)> = PHONE_RE
        .find_iter(line)
        .map(|m| (m.start(), m.end()))
        .filter(|(start, end)| {
            !targets
                .iter()
                .any(|(email_start, email_end)| start < email_end && email_start < end)
        })
        .collect();
    targets.extend(phones);
    targets.sort_unstable();
    targets
}

fn with_copy_controls(line: &str) -> String {
    let mut out = String::new();
    let mut cursor = 0;
    for (start, end) in copy_targets(line) {
        out.push_str(&escape_html(line.get(cursor..start).unwrap_or_default()));
        let value = escape_html(line.get(start..end).unwrap_or_default());
        let _ = write!(
            out,
            r#"<button type="button" class="sc-copy" data-copy="{value}">{value}</button>"#
        );
        cursor = end;
    }
    out.push_str(&escape_html(line.get(cursor..).unwrap_or_default()));
    out
}
