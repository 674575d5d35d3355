pub mod changelog;
pub mod rss_feed;

pub use changelog::ChangelogParser;
pub use rss_feed::RssFeedParser;

use crate::fetcher::Fetcher;
use crate::types::FeedParser;
use std::sync::Arc;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserKind {
    Feed,
    Changelog,
}

/// Picks the parser variant from the URL alone. Repository-hosted blob/raw text
/// files are changelogs; everything else is a syndication feed.
pub fn select_parser(url: &str) -> ParserKind {
    let Ok(parsed) = Url::parse(url) else {
        return ParserKind::Feed;
    };

    if parsed.host_str() == Some("raw.githubusercontent.com") || changelog::is_repository_file(&parsed) {
        ParserKind::Changelog
    } else {
        ParserKind::Feed
    }
}

/// One parser per variant, dispatched through `select_parser`.
#[derive(Clone)]
pub struct Parsers {
    feed: Arc<dyn FeedParser>,
    changelog: Arc<dyn FeedParser>,
}

impl Parsers {
    pub fn new(feed: Arc<dyn FeedParser>, changelog: Arc<dyn FeedParser>) -> Self {
        Self { feed, changelog }
    }

    pub fn from_fetcher(fetcher: Arc<Fetcher>) -> Self {
        Self::new(
            Arc::new(RssFeedParser::new(fetcher.clone())),
            Arc::new(ChangelogParser::new(fetcher)),
        )
    }

    pub fn get(&self, kind: ParserKind) -> Arc<dyn FeedParser> {
        match kind {
            ParserKind::Feed => self.feed.clone(),
            ParserKind::Changelog => self.changelog.clone(),
        }
    }

    pub fn for_url(&self, url: &str) -> Arc<dyn FeedParser> {
        self.get(select_parser(url))
    }
}
