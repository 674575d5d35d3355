use crate::seen_db::SqliteSeenBackend;
use crate::types::{Article, Result, SeenRecord, StoreConfig};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// Deterministic identity of an article: hex MD5 of its link.
pub fn identity_hash(link: &str) -> String {
    format!("{:x}", md5::compute(link.as_bytes()))
}

/// Key-value persistence for the seen-set, addressed by identity hash.
#[async_trait]
pub trait SeenBackend: Send + Sync {
    /// Which of `ids` are already stored. One round trip.
    async fn existing(&self, ids: &[String]) -> Result<HashSet<String>>;

    /// Writes `records` in a single transaction. Ids already stored keep their first record.
    async fn commit(&self, records: &[SeenRecord]) -> Result<()>;
}

/// In-process seen-set. Tracks round trips so batching can be observed.
#[derive(Default)]
pub struct MemorySeenBackend {
    records: RwLock<HashMap<String, SeenRecord>>,
    reads: AtomicUsize,
    commit_sizes: Mutex<Vec<usize>>,
}

impl MemorySeenBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn get(&self, id: &str) -> Option<SeenRecord> {
        self.records.read().await.get(id).cloned()
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn commit_sizes(&self) -> Vec<usize> {
        self.commit_sizes
            .lock()
            .map(|sizes| sizes.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SeenBackend for MemorySeenBackend {
    async fn existing(&self, ids: &[String]) -> Result<HashSet<String>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let records = self.records.read().await;
        Ok(ids.iter().filter(|id| records.contains_key(*id)).cloned().collect())
    }

    async fn commit(&self, records: &[SeenRecord]) -> Result<()> {
        let mut stored = self.records.write().await;
        for record in records {
            stored.entry(record.id.clone()).or_insert_with(|| record.clone());
        }
        if let Ok(mut sizes) = self.commit_sizes.lock() {
            sizes.push(records.len());
        }
        Ok(())
    }
}

/// Best-effort deduplication against the persisted seen-set. Without a backend
/// it passes everything through.
pub struct DedupStore {
    backend: Option<Arc<dyn SeenBackend>>,
    read_chunk_size: usize,
    write_batch_size: usize,
}

impl DedupStore {
    pub fn new(backend: Arc<dyn SeenBackend>) -> Self {
        let defaults = StoreConfig::default();
        Self {
            backend: Some(backend),
            read_chunk_size: defaults.read_chunk_size,
            write_batch_size: defaults.write_batch_size,
        }
    }

    pub fn disabled() -> Self {
        let defaults = StoreConfig::default();
        Self {
            backend: None,
            read_chunk_size: defaults.read_chunk_size,
            write_batch_size: defaults.write_batch_size,
        }
    }

    pub fn with_limits(mut self, read_chunk_size: usize, write_batch_size: usize) -> Self {
        self.read_chunk_size = read_chunk_size.max(1);
        self.write_batch_size = write_batch_size.max(1);
        self
    }

    /// Opens the configured SQLite seen-set. Any failure leaves deduplication disabled.
    pub async fn connect(config: &StoreConfig) -> Self {
        let Some(database_url) = config.database_url.as_deref() else {
            warn!("DATABASE_URL not set. Deduplication disabled.");
            return Self::disabled();
        };

        match SqliteSeenBackend::connect(database_url).await {
            Ok(backend) => {
                info!("Connected to seen-set store for deduplication.");
                Self::new(Arc::new(backend)).with_limits(config.read_chunk_size, config.write_batch_size)
            }
            Err(e) => {
                warn!("Seen-set store connection failed: {}. Deduplication disabled.", e);
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Articles whose identity is not yet in the seen-set, in input order.
    pub async fn filter_new(&self, articles: Vec<Article>) -> Vec<Article> {
        let total = articles.len();
        let candidates = unique_identities(articles);

        let Some(backend) = &self.backend else {
            return candidates;
        };
        if candidates.is_empty() {
            return candidates;
        }

        let ids: Vec<String> = candidates.iter().map(|a| identity_hash(&a.link)).collect();
        let mut seen_ids = HashSet::new();

        for chunk in ids.chunks(self.read_chunk_size) {
            match backend.existing(chunk).await {
                Ok(found) => seen_ids.extend(found),
                Err(e) => {
                    warn!("Seen-set lookup failed: {}. Treating all {} articles as new.", e, candidates.len());
                    return candidates;
                }
            }
        }

        let new_articles: Vec<Article> = candidates
            .into_iter()
            .zip(ids)
            .filter(|(_, id)| !seen_ids.contains(id))
            .map(|(article, _)| article)
            .collect();

        info!("Deduplication: {} processed -> {} new.", total, new_articles.len());
        new_articles
    }

    /// Records every identity-bearing article as processed and returns how many
    /// records were committed. Failed batches are logged; the remaining batches
    /// are still written.
    pub async fn save_processed(&self, articles: &[Article]) -> usize {
        let Some(backend) = &self.backend else {
            return 0;
        };

        let processed_at = Utc::now();
        let records: Vec<SeenRecord> = articles
            .iter()
            .filter(|a| a.has_identity())
            .map(|a| SeenRecord {
                id: identity_hash(&a.link),
                title: a.title.clone(),
                link: a.link.clone(),
                processed_at,
            })
            .collect();
        if records.is_empty() {
            return 0;
        }

        let mut batch: Vec<SeenRecord> = Vec::with_capacity(self.write_batch_size);
        let mut saved = 0;
        let mut failed = 0;

        for record in records {
            batch.push(record);
            if batch.len() >= self.write_batch_size {
                flush(backend.as_ref(), &mut batch, &mut saved, &mut failed).await;
            }
        }
        if !batch.is_empty() {
            flush(backend.as_ref(), &mut batch, &mut saved, &mut failed).await;
        }

        if failed > 0 {
            error!("Saved {} articles to history, {} failed to save.", saved, failed);
        } else {
            info!("Saved {} articles to history.", saved);
        }
        saved
    }
}

async fn flush(backend: &dyn SeenBackend, batch: &mut Vec<SeenRecord>, saved: &mut usize, failed: &mut usize) {
    match backend.commit(batch).await {
        Ok(()) => {
            debug!("Committed {} seen records", batch.len());
            *saved += batch.len();
        }
        Err(e) => {
            error!("Failed to commit {} seen records: {}", batch.len(), e);
            *failed += batch.len();
        }
    }
    batch.clear();
}

/// Drops articles without a usable link and repeats of a link already kept.
fn unique_identities(articles: Vec<Article>) -> Vec<Article> {
    let mut seen_links = HashSet::new();
    articles
        .into_iter()
        .filter(|article| {
            if !article.has_identity() {
                debug!("Dropping article without link: {} ({})", article.title, article.source);
                return false;
            }
            seen_links.insert(article.link.clone())
        })
        .collect()
}
