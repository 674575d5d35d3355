use crate::types::{Article, BriefError, Result};
use feed_rs::parser;
use regex::{Captures, Regex};
use std::sync::LazyLock;
use tracing::debug;

pub const SUMMARY_LIMIT: usize = 250;
pub const FULL_TEXT_LIMIT: usize = 300;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<.*?>").expect("valid tag pattern"));
static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("valid entity pattern"));

/// Removes markup, decodes character references and collapses whitespace.
pub fn strip_html(raw: Option<&str>) -> String {
    let raw = match raw {
        Some(raw) if !raw.is_empty() => raw,
        _ => return String::new(),
    };

    let without_tags = TAG_RE.replace_all(raw, "");
    let decoded = ENTITY_RE.replace_all(&without_tags, |caps: &Captures| {
        decode_entity(&caps[1]).unwrap_or_else(|| caps[0].to_string())
    });

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entity(entity: &str) -> Option<String> {
    if let Some(numeric) = entity.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse::<u32>().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }

    let decoded = match entity {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => " ",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "hellip" => "\u{2026}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201C}",
        "rdquo" => "\u{201D}",
        "copy" => "\u{00A9}",
        _ => return None,
    };
    Some(decoded.to_string())
}

/// First `max` chars of `text`.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Like `truncate_chars` but marks the cut with `...`.
pub fn ellipsize(text: &str, max: usize) -> String {
    let truncated = truncate_chars(text, max);
    if truncated.len() < text.len() {
        format!("{}...", truncated)
    } else {
        truncated.to_string()
    }
}

/// Parses an RSS, Atom or JSON feed document into articles attributed to `source`.
pub fn parse_feed(source: &str, content: &[u8]) -> Result<Vec<Article>> {
    debug!("Parsing feed content for {} ({} bytes)", source, content.len());

    let feed = parser::parse(content)
        .map_err(|e| BriefError::Parse(format!("Failed to parse feed: {}", e)))?;

    let articles: Vec<Article> = feed
        .entries
        .into_iter()
        .map(|entry| {
            let title = entry
                .title
                .map(|t| strip_html(Some(&t.content)))
                .unwrap_or_default();
            let link = entry
                .links
                .first()
                .map(|l| l.href.trim().to_string())
                .filter(|href| !href.is_empty())
                .unwrap_or_else(|| Article::MISSING_LINK.to_string());

            // Prefer the summary; fall back to the content body
            let raw_summary = entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body));
            let clean = strip_html(raw_summary.as_deref());

            let full_text = format!("{} - {}", title, truncate_chars(&clean, FULL_TEXT_LIMIT));
            Article::new(source, &title, &link, ellipsize(&clean, SUMMARY_LIMIT), full_text)
        })
        .collect();

    debug!("Parsed {} entries from {}", articles.len(), source);
    Ok(articles)
}
