use crate::llm_adapter::RankingClient;
use crate::types::{Article, BriefError, CurationConfig, Result};
use crate::utils::{strip_code_fence, KeywordScorer};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const DEFAULT_REASON: &str = "No analysis provided.";

const PERSONA_PROMPT: &str = r#"You are a Principal Cloud Architect and AI Engineer acting as an intelligent assistant for a Corporate IT System Engineer.

User Persona:
- Role: Internal Corporate IT System Engineer at a tech company.
- Core Stack: Microsoft Azure, Terraform, Python, GitHub Actions.
- Primary Work: Cloud-native hosting (Websites, Serverless, Storage, Networking).
- Recent Focus: AI Engineering (Deploying LLM endpoints, configuring AuthN/AuthZ for developer access).
- Context: Recently migrated from GitLab to GitHub.

Task: Review the provided headlines and curate the Top {limit} most relevant articles.

Selection Criteria:
1. High Priority (Must Have):
- Architectural patterns for deploying and securing LLMs/AI endpoints on Azure.
- Advanced Terraform patterns (Azure provider, state management, modules).
- GitHub Actions security hardening and reusable workflows.
- Azure networking deep dives (Private Link, DNS, Hub-and-Spoke topology).
2. Educational (Good to Have):
- Cloud-native identity patterns (OIDC, OAuth, Workload Identity).
- Python automation best practices for extensive cloud environments.
3. Ignore:
- Generic consumer tech news, product marketing fluff, basic "Hello World" tutorials, or GitLab-specific content."#;

const OUTPUT_CONTRACT: &str = r#"Output Format:
- Return a raw JSON list of objects.
- DO NOT use Markdown formatting (no ```json blocks) and no prose.
- Object schema: {"id": int, "rationale": "1 sentence architectural justification"}"#;

/// One pick returned by the ranking service, referencing a candidate by index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub id: usize,
    pub rationale: Option<String>,
}

#[derive(Serialize)]
struct PromptItem<'a> {
    id: usize,
    source: &'a str,
    text: &'a str,
}

/// Picks the most relevant articles of a group, with a short rationale each.
pub struct CurationEngine {
    client: Option<Arc<dyn RankingClient>>,
    config: CurationConfig,
    fallback: KeywordScorer,
}

impl CurationEngine {
    pub fn new(client: Option<Arc<dyn RankingClient>>, config: CurationConfig) -> Self {
        let fallback = KeywordScorer::new(&config.fallback_keywords);
        Self {
            client,
            config,
            fallback,
        }
    }

    pub fn has_client(&self) -> bool {
        self.client.is_some()
    }

    /// Up to `limit` curated copies of `articles`, each with `reason` set. A
    /// ranking failure yields an empty result unless the local fallback is on.
    pub async fn curate(&self, articles: &[Article], limit: usize) -> Vec<Article> {
        if articles.is_empty() || limit == 0 {
            return Vec::new();
        }

        let window = &articles[..articles.len().min(self.config.candidate_window)];
        if window.len() < articles.len() {
            debug!("Candidate window holds {} of {} articles", window.len(), articles.len());
        }

        match self.rank(window, limit).await {
            Ok(selections) => {
                let curated = resolve_selections(window, &selections, limit);
                info!("Curated {} of {} candidates", curated.len(), window.len());
                curated
            }
            Err(e) => {
                error!("Curation failed: {}", e);
                if self.config.local_fallback {
                    let picked = self.fallback.select(window, limit);
                    warn!("Using keyword fallback: {} articles selected", picked.len());
                    picked
                } else {
                    Vec::new()
                }
            }
        }
    }

    async fn rank(&self, window: &[Article], limit: usize) -> Result<Vec<Selection>> {
        let Some(client) = &self.client else {
            return Err(BriefError::Ranking("ranking client not initialized".to_string()));
        };

        let prompt = build_prompt(window, limit)?;
        let text = client.rank(&prompt).await?;
        parse_selections(&text)
    }
}

/// Persona preamble, the candidate list as JSON and the output contract.
pub fn build_prompt(candidates: &[Article], limit: usize) -> Result<String> {
    let items: Vec<PromptItem> = candidates
        .iter()
        .enumerate()
        .map(|(id, article)| PromptItem {
            id,
            source: &article.source,
            text: &article.full_text,
        })
        .collect();

    Ok(format!(
        "{}\n\nInput Data:\n{}\n\n{}\n",
        PERSONA_PROMPT.replace("{limit}", &limit.to_string()),
        serde_json::to_string(&items)?,
        OUTPUT_CONTRACT
    ))
}

/// Reads the service's JSON answer. Entries that are not objects with an
/// integer `id` are skipped.
pub fn parse_selections(text: &str) -> Result<Vec<Selection>> {
    let value: Value = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| BriefError::Ranking(format!("invalid JSON from ranking service: {}", e)))?;

    let Value::Array(entries) = value else {
        return Err(BriefError::Ranking("ranking response is not a JSON list".to_string()));
    };

    let selections = entries
        .iter()
        .filter_map(|entry| {
            let object = entry.as_object()?;
            let id = object.get("id")?.as_u64()?;
            let rationale = object
                .get("rationale")
                .or_else(|| object.get("analysis"))
                .and_then(Value::as_str)
                .map(str::to_string);
            Some(Selection {
                id: usize::try_from(id).ok()?,
                rationale,
            })
        })
        .collect();

    Ok(selections)
}

/// Maps selections back onto the candidate window in the service's order.
pub fn resolve_selections(candidates: &[Article], selections: &[Selection], limit: usize) -> Vec<Article> {
    let mut used = HashSet::new();
    let mut curated = Vec::new();

    for selection in selections {
        if curated.len() >= limit {
            break;
        }
        let Some(candidate) = candidates.get(selection.id) else {
            debug!("Ignoring out-of-range selection {}", selection.id);
            continue;
        };
        if !used.insert(selection.id) {
            continue;
        }

        let reason = selection
            .rationale
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_REASON);
        curated.push(candidate.clone().with_reason(reason));
    }

    curated
}
