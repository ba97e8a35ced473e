use anyhow::Context;
use secrecy::ExposeSecret;
use tracing::{error, info};

use restaurant_replier::channels::EmailTransport;
use restaurant_replier::config::{ReplierConfig, mask_secret};
use restaurant_replier::drafts::DraftStore;
use restaurant_replier::pipeline::MessageProcessor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ReplierConfig::from_env().context("Failed to load configuration")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        address = %config.email.address,
        password = %mask_secret(config.email.password.expose_secret()),
        imap = %format!("{}:{}", config.email.imap_host, config.email.imap_port),
        smtp = %format!("{}:{}", config.email.smtp_host, config.email.smtp_port),
        drafts = %config.drafts_dir.display(),
        reservation_keywords = config.keywords.reservation.len(),
        feedback_keywords = config.keywords.feedback.len(),
        "Restaurant replier starting"
    );

    let processor = MessageProcessor::new(&config.keywords, config.reply.clone());
    let transport = EmailTransport::new(config.email.clone());
    let drafts = DraftStore::new(config.drafts_dir.clone());

    let Some(interval) = config.poll_interval else {
        processor
            .run_once(&transport, &drafts)
            .await
            .context("Inbox pass failed")?;
        return Ok(());
    };

    info!("Polling every {}s", interval.as_secs());
    let mut tick = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = tick.tick() => {
                if let Err(e) = processor.run_once(&transport, &drafts).await {
                    error!(error = %e, "Inbox pass failed");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                return Ok(());
            }
        }
    }
}
