use crate::aggregator::FetchOrchestrator;
use crate::config::FeedGroups;
use crate::curation::CurationEngine;
use crate::state::DedupStore;
use crate::types::{Digest, DigestDelivery};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub fetched: usize,
    pub new_articles: usize,
    pub curated: usize,
    pub delivered: bool,
    /// Seen records actually committed this run.
    pub persisted: usize,
}

/// One daily run: fetch both feed groups, drop what was already seen, curate,
/// deliver, then remember every new article whether or not it was selected.
pub struct DailyBrief {
    orchestrator: FetchOrchestrator,
    store: DedupStore,
    curation: CurationEngine,
    delivery: Arc<dyn DigestDelivery>,
    feeds: FeedGroups,
    recipient: String,
    digest_limit: usize,
    dry_run: bool,
}

impl DailyBrief {
    pub fn new(
        orchestrator: FetchOrchestrator,
        store: DedupStore,
        curation: CurationEngine,
        delivery: Arc<dyn DigestDelivery>,
        feeds: FeedGroups,
        recipient: impl Into<String>,
        digest_limit: usize,
    ) -> Self {
        Self {
            orchestrator,
            store,
            curation,
            delivery,
            feeds,
            recipient: recipient.into(),
            digest_limit,
            dry_run: false,
        }
    }

    /// In a dry run nothing is written to the seen-set.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub async fn run(&self) -> RunReport {
        let mut report = RunReport::default();

        info!("Fetching platform updates...");
        let platform = self.orchestrator.fetch_all(&self.feeds.platform_updates).await;
        info!("Fetching blogs...");
        let blogs = self.orchestrator.fetch_all(&self.feeds.blogs).await;
        report.fetched = platform.len() + blogs.len();

        let new_platform = self.store.filter_new(platform).await;
        let new_blogs = self.store.filter_new(blogs).await;
        report.new_articles = new_platform.len() + new_blogs.len();

        if report.new_articles == 0 {
            info!("No new articles today!");
            return report;
        }

        let digest = Digest {
            platform: self.curation.curate(&new_platform, self.digest_limit).await,
            blogs: self.curation.curate(&new_blogs, self.digest_limit).await,
        };
        report.curated = digest.total();

        if digest.is_empty() {
            warn!("No curated articles from {} new articles; nothing sent.", report.new_articles);
        } else {
            report.delivered = self.delivery.deliver(&self.recipient, &digest).await;
        }

        if self.dry_run {
            info!("Dry run: skipping history update for {} articles.", report.new_articles);
            return report;
        }

        // Rejected and unranked articles are recorded too, so nothing is offered twice.
        let mut processed = new_platform;
        processed.extend(new_blogs);
        report.persisted = self.store.save_processed(&processed).await;

        report
    }
}
