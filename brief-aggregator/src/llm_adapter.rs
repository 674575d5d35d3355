use crate::types::{BriefError, CurationConfig, Result};
use async_trait::async_trait;
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// External ranking service. Given a fully built prompt, returns the raw model text.
#[async_trait]
pub trait RankingClient: Send + Sync {
    fn name(&self) -> String;

    async fn rank(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

/// Gemini `generateContent` over REST.
pub struct GeminiAdapter {
    client: Client,
    api_key: String,
    url: String,
    model: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl GeminiAdapter {
    pub fn new(api_key: impl Into<String>, config: &CurationConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            config.endpoint.trim_end_matches('/'),
            config.model
        );

        Ok(Self {
            client,
            api_key: api_key.into(),
            url,
            model: config.model.clone(),
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    async fn generate_once(&self, body: &GenerateRequest<'_>) -> std::result::Result<String, (BriefError, bool)> {
        let response = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| (BriefError::Http(e), true))?;

        let status = response.status();
        if !status.is_success() {
            let retryable = status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS;
            return Err((
                BriefError::Ranking(format!("{} returned HTTP {}", self.model, status.as_u16())),
                retryable,
            ));
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| (BriefError::Http(e), false))?;
        extract_text(parsed).map_err(|e| (e, false))
    }
}

fn extract_text(response: GenerateResponse) -> Result<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(BriefError::Ranking("empty response from ranking service".to_string()));
    }
    Ok(text)
}

#[async_trait]
impl RankingClient for GeminiAdapter {
    fn name(&self) -> String {
        format!("Gemini ({})", self.model)
    }

    async fn rank(&self, prompt: &str) -> Result<String> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: self.retry_delay,
            initial_interval: self.retry_delay,
            max_interval: self.retry_delay * 8,
            multiplier: 2.0,
            max_elapsed_time: None,
            ..Default::default()
        };

        info!("Asking {} to curate ({} prompt chars)", self.name(), prompt.len());

        let mut attempt = 0;
        loop {
            match self.generate_once(&body).await {
                Ok(text) => {
                    debug!("{} answered with {} chars", self.model, text.len());
                    return Ok(text);
                }
                Err((e, retryable)) => {
                    if !retryable || attempt >= self.max_retries {
                        return Err(e);
                    }
                    let wait = backoff.next_backoff().unwrap_or(self.retry_delay);
                    warn!("Ranking attempt {} failed: {}. Retrying in {:?}", attempt + 1, e, wait);
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
            }
        }
    }
}
