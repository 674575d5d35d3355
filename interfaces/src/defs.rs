use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub source: String,
    pub title: String,
    pub link: String,
    pub summary: String,
    pub full_text: String,
    #[serde(default)]
    pub reason: Option<String>,
}

impl Article {
    /// Placeholder link for feed entries that carry none. Never treated as an identity.
    pub const MISSING_LINK: &'static str = "#";

    pub fn new(source: &str, title: &str, link: &str, summary: String, full_text: String) -> Self {
        Self {
            source: source.to_owned(),
            title: title.to_owned(),
            link: link.to_owned(),
            summary,
            full_text,
            reason: None,
        }
    }

    /// Whether the link can serve as a deduplication key.
    pub fn has_identity(&self) -> bool {
        let link = self.link.trim();
        !link.is_empty() && !link.starts_with(Self::MISSING_LINK)
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeenRecord {
    pub id: String,
    pub title: String,
    pub link: String,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct Digest {
    pub platform: Vec<Article>,
    pub blogs: Vec<Article>,
}

impl Digest {
    pub fn total(&self) -> usize {
        self.platform.len() + self.blogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

// Contract note:
// A FeedParser owns every failure mode of its source. Network errors, bad
// status codes and malformed documents all end as an empty Vec plus a log
// line, so one broken feed can never abort the batch it is part of.

#[async_trait]
pub trait FeedParser: Send + Sync {
    fn name(&self) -> &'static str;
    async fn fetch(&self, source: &str, url: &str) -> Vec<Article>;
}

#[async_trait]
pub trait DigestDelivery: Send + Sync {
    /// Returns whether the digest reached the transport. Implementations log their own outcome.
    async fn deliver(&self, recipient: &str, digest: &Digest) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(link: &str) -> Article {
        Article::new("Source", "Title", link, String::new(), String::new())
    }

    #[test]
    fn missing_links_have_no_identity() {
        assert!(!article("").has_identity());
        assert!(!article("   ").has_identity());
        assert!(!article(Article::MISSING_LINK).has_identity());
        assert!(article("https://example.com/post").has_identity());
    }

    #[test]
    fn with_reason_only_touches_reason() {
        let original = article("https://example.com/a");
        let curated = original.clone().with_reason("Relevant");
        assert_eq!(curated.reason.as_deref(), Some("Relevant"));
        assert_eq!(curated.link, original.link);
        assert_eq!(curated.summary, original.summary);
    }
}
