use crate::types::Article;

/// Deterministic local ranking used when the ranking service is unavailable and
/// the fallback is switched on. A keyword in the title scores 2, in the body 1.
#[derive(Debug, Clone)]
pub struct KeywordScorer {
    keywords: Vec<String>,
}

impl KeywordScorer {
    pub fn new(keywords: &[String]) -> Self {
        Self {
            keywords: keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// Score and matched keywords for a single article.
    pub fn score(&self, article: &Article) -> (u32, Vec<&str>) {
        let title = article.title.to_lowercase();
        let body = article.full_text.to_lowercase();

        let mut score = 0;
        let mut matched = Vec::new();
        for keyword in &self.keywords {
            let mut hit = false;
            if title.contains(keyword.as_str()) {
                score += 2;
                hit = true;
            }
            if body.contains(keyword.as_str()) {
                score += 1;
                hit = true;
            }
            if hit {
                matched.push(keyword.as_str());
            }
        }
        (score, matched)
    }

    /// Top `limit` articles with a positive score. Ties keep input order.
    pub fn select(&self, articles: &[Article], limit: usize) -> Vec<Article> {
        let mut scored: Vec<(u32, &Article, String)> = articles
            .iter()
            .filter_map(|article| {
                let (score, matched) = self.score(article);
                (score > 0).then(|| (score, article, matched.join(", ")))
            })
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0));

        scored
            .into_iter()
            .take(limit)
            .map(|(_, article, matched)| article.clone().with_reason(format!("Keyword match: {}", matched)))
            .collect()
    }
}

/// Removes a surrounding Markdown code fence (```` ``` ```` or ```` ```json ````).
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest.trim_start_matches(|c: char| c.is_alphanumeric()),
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, body: &str) -> Article {
        Article::new("Test", title, &format!("https://example.com/{}", title), String::new(), body.to_string())
    }

    #[test]
    fn title_hits_outweigh_body_hits() {
        let scorer = KeywordScorer::new(&["terraform".to_string(), "azure".to_string()]);
        let (score, matched) = scorer.score(&article("Terraform on Azure", "azure networking"));
        assert_eq!(score, 5);
        assert_eq!(matched, vec!["terraform", "azure"]);
    }

    #[test]
    fn zero_score_is_excluded_and_ties_keep_order() {
        let scorer = KeywordScorer::new(&["python".to_string()]);
        let articles = vec![
            article("first", "python"),
            article("unrelated", "gardening"),
            article("second", "python"),
        ];
        let picked = scorer.select(&articles, 10);
        assert_eq!(picked.len(), 2);
        assert_eq!(picked[0].title, "first");
        assert_eq!(picked[1].title, "second");
        assert_eq!(picked[0].reason.as_deref(), Some("Keyword match: python"));
    }

    #[test]
    fn fences_are_stripped() {
        assert_eq!(strip_code_fence("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("```\n[]\n```"), "[]");
        assert_eq!(strip_code_fence("  [2] "), "[2]");
    }
}
