use serde::{Deserialize, Serialize};

pub use interfaces::defs::{Article, Digest, DigestDelivery, FeedParser, SeenRecord};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
    pub max_concurrent_fetches: usize,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "DailyTechBriefBot/1.0".to_string(),
            timeout_seconds: 10,
            max_retries: 1,
            retry_delay_seconds: 1,
            max_concurrent_fetches: 8,
            max_redirects: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CurationConfig {
    pub model: String,
    pub endpoint: String,
    pub timeout_seconds: u64,
    pub candidate_window: usize,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub local_fallback: bool,
    pub fallback_keywords: Vec<String>,
}

impl Default for CurationConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            timeout_seconds: 60,
            candidate_window: 500,
            max_retries: 2,
            retry_delay_ms: 500,
            local_fallback: false,
            fallback_keywords: [
                "azure",
                "terraform",
                "github actions",
                "python",
                "llm",
                "openai",
                "private link",
                "oidc",
                "workload identity",
                "security",
            ]
            .iter()
            .map(|k| k.to_string())
            .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub database_url: Option<String>,
    pub read_chunk_size: usize,
    pub write_batch_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            read_chunk_size: 30,
            write_batch_size: 400,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BriefError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Ranking service error: {0}")]
    Ranking(String),

    #[error("Configuration error: {message}")]
    Config { message: String, key: Option<String> },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("General error: {0}")]
    General(String),
}

impl BriefError {
    pub fn missing_setting(key: &str) -> Self {
        BriefError::Config {
            message: format!("{} not set", key),
            key: Some(key.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, BriefError>;
