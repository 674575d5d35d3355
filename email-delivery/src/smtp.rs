use crate::render::{render_digest_html, subject_line};
use anyhow::{Context, Result};
use async_trait::async_trait;
use interfaces::defs::{Digest, DigestDelivery};
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{error, info};

#[derive(Clone)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Sends the digest as an HTML mail from the configured account over STARTTLS.
pub struct EmailDelivery {
    config: SmtpConfig,
}

impl EmailDelivery {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    pub fn build_message(&self, recipient: &str, digest: &Digest) -> Result<Message> {
        let message = Message::builder()
            .from(
                self.config
                    .username
                    .parse()
                    .with_context(|| format!("invalid sender address '{}'", self.config.username))?,
            )
            .to(recipient
                .parse()
                .with_context(|| format!("invalid recipient address '{}'", recipient))?)
            .subject(subject_line(digest))
            .header(ContentType::TEXT_HTML)
            .body(render_digest_html(digest))?;
        Ok(message)
    }

    async fn send(&self, message: Message) -> Result<()> {
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.server)?
            .port(self.config.port)
            .credentials(Credentials::new(
                self.config.username.clone(),
                self.config.password.clone(),
            ))
            .build();

        mailer.send(message).await?;
        Ok(())
    }
}

#[async_trait]
impl DigestDelivery for EmailDelivery {
    async fn deliver(&self, recipient: &str, digest: &Digest) -> bool {
        if digest.is_empty() {
            info!("No articles to send.");
            return false;
        }

        let message = match self.build_message(recipient, digest) {
            Ok(message) => message,
            Err(e) => {
                error!("Email failed: {:#}", e);
                return false;
            }
        };

        match self.send(message).await {
            Ok(()) => {
                info!("Email sent to {} with {} articles.", recipient, digest.total());
                true
            }
            Err(e) => {
                error!("Email failed: {:#}", e);
                false
            }
        }
    }
}
