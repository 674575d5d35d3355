#![allow(dead_code)]

use async_trait::async_trait;
use brief_aggregator::{Article, BriefError, Digest, DigestDelivery, FeedParser, RankingClient, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, Once};

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .try_init()
            .ok();
    });
}

pub fn article(source: &str, n: usize) -> Article {
    Article::new(
        source,
        &format!("{} article {}", source, n),
        &format!("https://{}.example.com/posts/{}", source.to_lowercase().replace(' ', "-"), n),
        format!("Summary {}", n),
        format!("{} article {} - body text {}", source, n, n),
    )
}

pub fn articles(source: &str, count: usize) -> Vec<Article> {
    (0..count).map(|n| article(source, n)).collect()
}

/// Returns the same articles for every URL it is asked about.
pub struct StubParser {
    pub items: Vec<Article>,
}

#[async_trait]
impl FeedParser for StubParser {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn fetch(&self, source: &str, _url: &str) -> Vec<Article> {
        self.items
            .iter()
            .cloned()
            .map(|mut a| {
                a.source = source.to_string();
                a
            })
            .collect()
    }
}

/// Produces `per_source` articles per source, panicking for any URL containing "explode".
pub struct GeneratingParser {
    pub per_source: usize,
}

#[async_trait]
impl FeedParser for GeneratingParser {
    fn name(&self) -> &'static str {
        "generating"
    }

    async fn fetch(&self, source: &str, url: &str) -> Vec<Article> {
        if url.contains("explode") {
            panic!("parser blew up on {}", url);
        }
        articles(source, self.per_source)
    }
}

/// Ranking client answering with a fixed body, or failing.
pub struct StubRanking {
    pub response: Option<String>,
    pub calls: AtomicUsize,
}

impl StubRanking {
    pub fn answering(response: impl Into<String>) -> Self {
        Self {
            response: Some(response.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Selects ids `0..count`, each with a rationale.
    pub fn selecting_first(count: usize) -> Self {
        let picks: Vec<String> = (0..count)
            .map(|id| format!(r#"{{"id": {}, "rationale": "pick {}"}}"#, id, id))
            .collect();
        Self::answering(format!("[{}]", picks.join(",")))
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RankingClient for StubRanking {
    fn name(&self) -> String {
        "stub".to_string()
    }

    async fn rank(&self, _prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response
            .clone()
            .ok_or_else(|| BriefError::Ranking("service unavailable".to_string()))
    }
}

/// Keeps every digest it is handed.
#[derive(Default)]
pub struct RecordingDelivery {
    pub sent: Mutex<Vec<(String, Digest)>>,
}

impl RecordingDelivery {
    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl DigestDelivery for RecordingDelivery {
    async fn deliver(&self, recipient: &str, digest: &Digest) -> bool {
        self.sent.lock().unwrap().push((recipient.to_string(), digest.clone()));
        true
    }
}
