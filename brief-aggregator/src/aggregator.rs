use crate::config::FeedMap;
use crate::sources::Parsers;
use crate::types::Article;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Fans fetches out over every configured source and gathers the results.
pub struct FetchOrchestrator {
    parsers: Parsers,
    semaphore: Arc<Semaphore>,
}

impl FetchOrchestrator {
    pub fn new(parsers: Parsers, max_concurrent_fetches: usize) -> Self {
        Self {
            parsers,
            semaphore: Arc::new(Semaphore::new(max_concurrent_fetches.max(1))),
        }
    }

    /// Fetches all sources concurrently and waits for every one of them. A source
    /// whose task dies contributes nothing; the others are unaffected. The order
    /// of the returned articles is unspecified.
    pub async fn fetch_all(&self, feeds: &FeedMap) -> Vec<Article> {
        info!("Fetching {} sources", feeds.len());

        let handles: Vec<(String, JoinHandle<Vec<Article>>)> = feeds
            .iter()
            .map(|(source, url)| {
                let parser = self.parsers.for_url(url);
                let semaphore = self.semaphore.clone();
                let task_source = source.clone();
                let url = url.clone();

                let handle = tokio::spawn(async move {
                    let _permit = match semaphore.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(e) => {
                            error!("Fetch pool closed before {} could run: {}", task_source, e);
                            return Vec::new();
                        }
                    };
                    debug!("Fetching {} with {} parser", task_source, parser.name());
                    parser.fetch(&task_source, &url).await
                });

                (source.clone(), handle)
            })
            .collect();

        let mut articles = Vec::new();
        let mut failed_sources = 0;

        for (source, handle) in handles {
            match handle.await {
                Ok(items) => {
                    debug!("{} returned {} items", source, items.len());
                    articles.extend(items);
                }
                Err(e) => {
                    failed_sources += 1;
                    error!("{} generated an exception: {}", source, e);
                }
            }
        }

        info!(
            "Fetched {} articles from {} sources ({} failed)",
            articles.len(),
            feeds.len(),
            failed_sources
        );
        articles
    }
}
