use crate::fetcher::Fetcher;
use crate::parser;
use crate::types::{Article, FeedParser};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info};

/// Generic syndication feed source (RSS, Atom, JSON Feed).
pub struct RssFeedParser {
    fetcher: Arc<Fetcher>,
}

impl RssFeedParser {
    pub fn new(fetcher: Arc<Fetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl FeedParser for RssFeedParser {
    fn name(&self) -> &'static str {
        "rss"
    }

    async fn fetch(&self, source: &str, url: &str) -> Vec<Article> {
        let content = match self.fetcher.fetch_bytes(url).await {
            Ok(content) => content,
            Err(e) => {
                error!("Network error fetching {}: {}", source, e);
                return Vec::new();
            }
        };

        match parser::parse_feed(source, &content) {
            Ok(articles) => {
                info!("Pulled {} items from {}", articles.len(), source);
                articles
            }
            Err(e) => {
                error!("Error parsing {}: {}", source, e);
                Vec::new()
            }
        }
    }
}
