pub mod types;
pub mod config;
pub mod fetcher;
pub mod parser;
pub mod sources;
pub mod aggregator;
pub mod state;
pub mod seen_db;
pub mod llm_adapter;
pub mod curation;
pub mod utils;
pub mod pipeline;

pub use types::*;
pub use config::{AppConfig, Credentials, FeedGroups, FeedMap};
pub use fetcher::Fetcher;
pub use sources::{select_parser, ChangelogParser, ParserKind, Parsers, RssFeedParser};
pub use aggregator::FetchOrchestrator;
pub use state::{identity_hash, DedupStore, MemorySeenBackend, SeenBackend};
pub use seen_db::SqliteSeenBackend;
pub use llm_adapter::{GeminiAdapter, RankingClient};
pub use curation::{CurationEngine, Selection};
pub use pipeline::{DailyBrief, RunReport};
