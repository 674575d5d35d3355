mod common;

use brief_aggregator::config::{FeedGroups, FeedMap};
use brief_aggregator::{
    CurationConfig, CurationEngine, DailyBrief, DedupStore, DigestDelivery, FetchOrchestrator, MemorySeenBackend,
    Parsers, RankingClient, RunReport,
};
use common::{article, init_tracing, GeneratingParser, RecordingDelivery, StubParser, StubRanking};
use std::sync::Arc;

fn feed_map(entries: &[(&str, &str)]) -> FeedMap {
    entries
        .iter()
        .map(|(name, url)| (name.to_string(), url.to_string()))
        .collect()
}

fn generating_orchestrator(per_source: usize) -> FetchOrchestrator {
    let parser = Arc::new(GeneratingParser { per_source });
    FetchOrchestrator::new(Parsers::new(parser.clone(), parser), 4)
}

fn feeds() -> FeedGroups {
    FeedGroups {
        platform_updates: feed_map(&[
            ("Azure Updates", "https://azure.example.com/feed"),
            ("Actions Changelog", "https://github.com/org/actions/blob/main/CHANGELOG.md"),
        ]),
        blogs: feed_map(&[
            ("Dev Blog", "https://dev.example.com/feed"),
            ("Cloud Blog", "https://cloud.example.com/rss"),
        ]),
    }
}

fn brief(
    backend: Arc<MemorySeenBackend>,
    ranking: StubRanking,
    delivery: Arc<RecordingDelivery>,
) -> DailyBrief {
    let ranking: Arc<dyn RankingClient> = Arc::new(ranking);
    let delivery: Arc<dyn DigestDelivery> = delivery;
    DailyBrief::new(
        generating_orchestrator(10),
        DedupStore::new(backend),
        CurationEngine::new(Some(ranking), CurationConfig::default()),
        delivery,
        feeds(),
        "me@example.com",
        15,
    )
}

#[tokio::test]
async fn panicking_source_does_not_sink_the_batch() {
    init_tracing();
    let feeds = feed_map(&[
        ("Alpha", "https://alpha.example.com/feed"),
        ("Bravo", "https://bravo.example.com/explode"),
        ("Charlie", "https://charlie.example.com/feed"),
    ]);

    let articles = generating_orchestrator(3).fetch_all(&feeds).await;

    assert_eq!(articles.len(), 6);
    assert!(articles.iter().all(|a| a.source != "Bravo"));
    assert_eq!(articles.iter().filter(|a| a.source == "Alpha").count(), 3);
    assert_eq!(articles.iter().filter(|a| a.source == "Charlie").count(), 3);
}

#[tokio::test]
async fn sources_are_routed_by_url() {
    init_tracing();
    let feed = Arc::new(StubParser {
        items: vec![article("feed", 1)],
    });
    let changelog = Arc::new(StubParser {
        items: vec![article("changelog", 1)],
    });
    let orchestrator = FetchOrchestrator::new(Parsers::new(feed, changelog), 2);

    let articles = orchestrator
        .fetch_all(&feed_map(&[
            ("Blog", "https://blog.example.com/feed"),
            ("Tool", "https://github.com/org/tool/blob/main/CHANGELOG.md"),
        ]))
        .await;

    assert_eq!(articles.len(), 2);
    let tool = articles.iter().find(|a| a.source == "Tool").unwrap();
    assert_eq!(tool.title, "changelog article 1");
    let blog = articles.iter().find(|a| a.source == "Blog").unwrap();
    assert_eq!(blog.title, "feed article 1");
}

#[tokio::test]
async fn empty_feed_map_fetches_nothing() {
    init_tracing();
    assert!(generating_orchestrator(3).fetch_all(&FeedMap::new()).await.is_empty());
}

#[tokio::test]
async fn full_run_delivers_and_records_every_new_article() {
    init_tracing();
    let backend = Arc::new(MemorySeenBackend::new());
    let delivery = Arc::new(RecordingDelivery::default());

    let report = brief(backend.clone(), StubRanking::selecting_first(15), delivery.clone())
        .run()
        .await;

    assert_eq!(
        report,
        RunReport {
            fetched: 40,
            new_articles: 40,
            curated: 30,
            delivered: true,
            persisted: 40,
        }
    );
    assert_eq!(backend.len().await, 40);

    let sent = delivery.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    let (recipient, digest) = &sent[0];
    assert_eq!(recipient, "me@example.com");
    assert_eq!(digest.platform.len(), 15);
    assert_eq!(digest.blogs.len(), 15);
    assert!(digest.platform.iter().all(|a| a.reason.is_some()));
    assert!(digest
        .platform
        .iter()
        .all(|a| a.source == "Azure Updates" || a.source == "Actions Changelog"));
}

#[tokio::test]
async fn second_run_finds_nothing_new() {
    init_tracing();
    let backend = Arc::new(MemorySeenBackend::new());
    let delivery = Arc::new(RecordingDelivery::default());

    brief(backend.clone(), StubRanking::selecting_first(15), delivery.clone())
        .run()
        .await;
    let report = brief(backend.clone(), StubRanking::selecting_first(15), delivery.clone())
        .run()
        .await;

    assert_eq!(report.fetched, 40);
    assert_eq!(report.new_articles, 0);
    assert!(!report.delivered);
    assert_eq!(delivery.sent_count(), 1);
}

#[tokio::test]
async fn failed_curation_still_records_new_articles() {
    init_tracing();
    let backend = Arc::new(MemorySeenBackend::new());
    let delivery = Arc::new(RecordingDelivery::default());

    let report = brief(backend.clone(), StubRanking::failing(), delivery.clone())
        .run()
        .await;

    assert_eq!(report.new_articles, 40);
    assert_eq!(report.curated, 0);
    assert!(!report.delivered);
    assert_eq!(report.persisted, 40);
    assert_eq!(delivery.sent_count(), 0);
    assert_eq!(backend.len().await, 40);
}

#[tokio::test]
async fn rejected_articles_are_not_offered_again() {
    init_tracing();
    let backend = Arc::new(MemorySeenBackend::new());
    let delivery = Arc::new(RecordingDelivery::default());

    let first = brief(backend.clone(), StubRanking::answering("[]"), delivery.clone())
        .run()
        .await;
    assert_eq!(first.new_articles, 40);
    assert_eq!(first.curated, 0);
    assert!(!first.delivered);
    assert_eq!(first.persisted, 40);

    let second = brief(backend.clone(), StubRanking::answering("[]"), delivery.clone())
        .run()
        .await;
    assert_eq!(second.new_articles, 0);
    assert_eq!(second.persisted, 0);
    assert_eq!(delivery.sent_count(), 0);
    assert_eq!(backend.len().await, 40);
}

#[tokio::test]
async fn persisted_counts_only_committed_records() {
    init_tracing();
    let ranking: Arc<dyn RankingClient> = Arc::new(StubRanking::selecting_first(15));
    let delivery: Arc<dyn DigestDelivery> = Arc::new(RecordingDelivery::default());
    let brief = DailyBrief::new(
        generating_orchestrator(10),
        DedupStore::disabled(),
        CurationEngine::new(Some(ranking), CurationConfig::default()),
        delivery,
        feeds(),
        "me@example.com",
        15,
    );

    let report = brief.run().await;
    assert_eq!(report.new_articles, 40);
    assert!(report.delivered);
    assert_eq!(report.persisted, 0);
}

#[tokio::test]
async fn dry_run_delivers_without_recording() {
    init_tracing();
    let backend = Arc::new(MemorySeenBackend::new());
    let delivery = Arc::new(RecordingDelivery::default());

    let report = brief(backend.clone(), StubRanking::selecting_first(5), delivery.clone())
        .with_dry_run(true)
        .run()
        .await;

    assert_eq!(report.curated, 10);
    assert!(report.delivered);
    assert_eq!(report.persisted, 0);
    assert_eq!(backend.len().await, 0);
}
