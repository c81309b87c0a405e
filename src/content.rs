//! Best-effort text cleanup for article content blocks.
//!
//! Feed content arrives as HTML-ish strings, sometimes with literal `\uXXXX`
//! escapes left in by the upstream encoder. This is a sanitiser for display,
//! not a faithful decoder: unknown or invalid escapes are left untouched.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use scraper::Html;

static UNICODE_ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\u([0-9a-fA-F]{4})").expect("unicode escape regex compiles"));

/// Replace literal `\uXXXX` sequences with the character they name.
pub fn decode_unicode_escapes(s: &str) -> String {
    UNICODE_ESCAPE
        .replace_all(s, |caps: &Captures| {
            u32::from_str_radix(&caps[1], 16)
                .ok()
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Plain text of one content block, entities decoded and whitespace collapsed.
pub fn block_text(block: &str) -> String {
    let decoded = decode_unicode_escapes(block);
    let fragment = Html::parse_fragment(&decoded);
    let text: String = fragment.root_element().text().collect();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Non-empty plain-text paragraphs, one per content block.
pub fn paragraphs(blocks: &[String]) -> Vec<String> {
    blocks
        .iter()
        .map(|b| block_text(b))
        .filter(|p| !p.is_empty())
        .collect()
}

/// Short plain-text teaser of at most `max_chars` characters plus an ellipsis.
pub fn excerpt(blocks: &[String], max_chars: usize) -> String {
    let text = paragraphs(blocks).join(" ");
    if text.chars().count() <= max_chars {
        return text;
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}…", cut.trim_end())
}
