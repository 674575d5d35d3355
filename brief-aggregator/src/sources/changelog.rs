use crate::fetcher::Fetcher;
use crate::parser::{ellipsize, truncate_chars, FULL_TEXT_LIMIT, SUMMARY_LIMIT};
use crate::types::{Article, FeedParser};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info};
use url::Url;

/// Only the newest sections of a changelog are offered per run.
pub const MAX_CHANGELOG_SECTIONS: usize = 5;

/// Reads a Markdown changelog hosted in a repository and turns each `## ` section
/// into an article.
pub struct ChangelogParser {
    fetcher: Arc<Fetcher>,
}

impl ChangelogParser {
    pub fn new(fetcher: Arc<Fetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl FeedParser for ChangelogParser {
    fn name(&self) -> &'static str {
        "changelog"
    }

    async fn fetch(&self, source: &str, url: &str) -> Vec<Article> {
        let raw_url = to_raw_url(url);
        let content = match self.fetcher.fetch_text(&raw_url).await {
            Ok(content) => content,
            Err(e) => {
                error!("Network error fetching {}: {}", source, e);
                return Vec::new();
            }
        };

        let articles = split_changelog(source, url, &content);
        info!("Pulled {} changelog sections from {}", articles.len(), source);
        articles
    }
}

/// Path segments of a file view on a repository host (`<org>/<repo>/blob|raw/<ref>/<path>`).
fn repository_file_segments(url: &Url) -> Option<Vec<&str>> {
    if !matches!(url.host_str(), Some("github.com") | Some("www.github.com")) {
        return None;
    }
    let segments: Vec<&str> = url.path_segments()?.collect();
    if segments.len() >= 5 && matches!(segments[2], "blob" | "raw") {
        Some(segments)
    } else {
        None
    }
}

/// Whether `url` points at a single file inside a repository rather than a feed.
pub fn is_repository_file(url: &Url) -> bool {
    repository_file_segments(url).is_some()
}

/// `github.com/<org>/<repo>/blob/<ref>/<path>` -> `raw.githubusercontent.com/<org>/<repo>/<ref>/<path>`.
/// Anything else is returned unchanged.
pub fn to_raw_url(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    let Some(segments) = repository_file_segments(&parsed) else {
        return url.to_string();
    };

    let path = format!("/{}/{}", segments[..2].join("/"), segments[3..].join("/"));
    if parsed.set_host(Some("raw.githubusercontent.com")).is_err() {
        return url.to_string();
    }
    parsed.set_path(&path);
    parsed.to_string()
}

/// GitHub-style heading anchor.
pub fn make_anchor(header: &str) -> String {
    header
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect::<String>()
        .replace(' ', "-")
}

/// Splits changelog text on level-2 headers outside code fences. Links point
/// back at `url` with the section anchor so every version has its own identity.
pub fn split_changelog(source: &str, url: &str, content: &str) -> Vec<Article> {
    let mut sections: Vec<(String, Vec<&str>)> = Vec::new();
    let mut in_fence = false;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
        }

        let header = if in_fence { None } else { trimmed.strip_prefix("## ") };
        if let Some(header) = header {
            sections.push((header.trim().to_string(), Vec::new()));
        } else if let Some((_, body)) = sections.last_mut() {
            body.push(line);
        }
    }

    sections
        .into_iter()
        .take(MAX_CHANGELOG_SECTIONS)
        .map(|(header, body)| {
            let body = body.join("\n");
            let body = body.trim();
            let link = format!("{}#{}", url, make_anchor(&header));
            let full_text = format!("{}\n\n{}", header, truncate_chars(body, FULL_TEXT_LIMIT));
            Article::new(
                source,
                &format!("Changelog {}", header),
                &link,
                ellipsize(body, SUMMARY_LIMIT),
                full_text,
            )
        })
        .collect()
}
