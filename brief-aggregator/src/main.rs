use anyhow::Context;
use brief_aggregator::{
    AppConfig, CurationEngine, Credentials, DailyBrief, DedupStore, FetchOrchestrator, Fetcher,
    GeminiAdapter, Parsers, RankingClient,
};
use clap::Parser;
use email_delivery::{EmailDelivery, SmtpConfig};
use interfaces::defs::DigestDelivery;
use interfaces::empty::DiscardDelivery;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "daily-brief", about = "Curated daily digest of platform updates and engineering blogs")]
struct Args {
    /// Path to the JSON feed configuration
    #[arg(long, default_value = "config/config.json")]
    config: PathBuf,

    /// Articles to keep per group, overriding `digest_limit`
    #[arg(long)]
    limit: Option<usize>,

    /// Log the digest instead of mailing it and leave the history untouched
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    info!("Starting Daily Brief");

    let mut config = AppConfig::load(&args.config)
        .with_context(|| format!("failed to load config from {}", args.config.display()))?;
    let credentials = Credentials::from_env(!args.dry_run).context("missing credentials")?;

    if let Some(database_url) = &credentials.database_url {
        config.store.database_url = Some(database_url.clone());
    }
    let digest_limit = args.limit.unwrap_or(config.digest_limit);

    let fetcher = Arc::new(Fetcher::new(config.fetch.clone())?);
    let orchestrator = FetchOrchestrator::new(
        Parsers::from_fetcher(fetcher),
        config.fetch.max_concurrent_fetches,
    );

    let store = DedupStore::connect(&config.store).await;

    let ranking: Option<Arc<dyn RankingClient>> =
        match GeminiAdapter::new(credentials.gemini_key.clone(), &config.curation) {
            Ok(adapter) => Some(Arc::new(adapter)),
            Err(e) => {
                error!("Failed to initialize ranking client: {}", e);
                None
            }
        };
    let curation = CurationEngine::new(ranking, config.curation.clone());

    let delivery: Arc<dyn DigestDelivery> = if args.dry_run {
        Arc::new(DiscardDelivery)
    } else {
        Arc::new(EmailDelivery::new(SmtpConfig {
            server: config.smtp_server.clone(),
            port: config.smtp_port,
            username: credentials.email_user.clone(),
            password: credentials.email_password.clone(),
        }))
    };

    let brief = DailyBrief::new(
        orchestrator,
        store,
        curation,
        delivery,
        config.feeds,
        credentials.email_recipient,
        digest_limit,
    )
    .with_dry_run(args.dry_run);

    let report = brief.run().await;
    info!(
        "Run complete: {} fetched, {} new, {} curated, delivered: {}, {} recorded",
        report.fetched, report.new_articles, report.curated, report.delivered, report.persisted
    );
    Ok(())
}
