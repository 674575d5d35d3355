use async_trait::async_trait;
use tracing::info;

use crate::defs::Digest;
use crate::defs::DigestDelivery;

/// Delivery that sends nothing. Logs what would have gone out.
pub struct DiscardDelivery;

#[async_trait]
impl DigestDelivery for DiscardDelivery {
    async fn deliver(&self, recipient: &str, digest: &Digest) -> bool {
        info!("Dry run: {} articles for {} not sent", digest.total(), recipient);
        for article in digest.platform.iter().chain(digest.blogs.iter()) {
            info!(
                "  [{}] {} <{}> - {}",
                article.source,
                article.title,
                article.link,
                article.reason.as_deref().unwrap_or("")
            );
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defs::Article;

    #[tokio::test]
    async fn discard_reports_success() {
        let digest = Digest {
            platform: vec![Article::new("A", "t", "https://a", String::new(), String::new())],
            blogs: Vec::new(),
        };
        assert!(DiscardDelivery.deliver("me@example.com", &digest).await);
    }
}
