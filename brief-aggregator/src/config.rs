use crate::types::{BriefError, CurationConfig, FetchConfig, Result, StoreConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// Source name -> feed URL.
pub type FeedMap = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedGroups {
    pub platform_updates: FeedMap,
    pub blogs: FeedMap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub feeds: FeedGroups,
    pub smtp_server: String,
    pub smtp_port: u16,
    pub digest_limit: usize,
    pub fetch: FetchConfig,
    pub curation: CurationConfig,
    pub store: StoreConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            feeds: FeedGroups::default(),
            smtp_server: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            digest_limit: 15,
            fetch: FetchConfig::default(),
            curation: CurationConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads the JSON config file. A missing file yields the defaults with no feeds.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Config file not found at {}. Using empty config.", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(BriefError::Io(e)),
        };

        let config = Self::from_json(&content)?;
        info!(
            "Loaded config from {}: {} platform feeds, {} blog feeds",
            path.display(),
            config.feeds.platform_updates.len(),
            config.feeds.blogs.len()
        );
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

/// Secrets and endpoints taken from the process environment.
#[derive(Clone)]
pub struct Credentials {
    pub email_user: String,
    pub email_password: String,
    pub email_recipient: String,
    pub gemini_key: String,
    pub database_url: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email_user", &self.email_user)
            .field("email_recipient", &self.email_recipient)
            .field("database_url", &self.database_url.as_ref().map(|_| "***"))
            .finish_non_exhaustive()
    }
}

impl Credentials {
    pub fn from_env(require_email: bool) -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), require_email)
    }

    /// Builds credentials from an arbitrary lookup. Missing required values are fatal.
    pub fn from_lookup<F>(lookup: F, require_email: bool) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let gemini_key = get("GEMINI_KEY").ok_or_else(|| BriefError::missing_setting("GEMINI_KEY"))?;

        let email_user = get("EMAIL_USER").unwrap_or_default();
        let email_password = get("EMAIL_PASS").unwrap_or_default();
        if require_email {
            if email_user.is_empty() {
                return Err(BriefError::missing_setting("EMAIL_USER"));
            }
            if email_password.is_empty() {
                return Err(BriefError::missing_setting("EMAIL_PASS"));
            }
        }

        let email_recipient = get("EMAIL_RECIPIENT").unwrap_or_else(|| email_user.clone());

        Ok(Self {
            email_user,
            email_password,
            email_recipient,
            gemini_key,
            database_url: get("DATABASE_URL"),
        })
    }
}
