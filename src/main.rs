use anyhow::Result;
use comment_translator::{config::Config, server};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("comment_translator=info".parse()?),
        )
        .init();

    info!("Starting comment translator");

    // Load configuration from environment
    let config = Config::from_env()?;
    info!(
        "Translating {} comments to {} (page snapshot: {})",
        config.source_language.name(),
        config.target_lang,
        config.page_snapshot.display()
    );

    server::serve(&config).await
}
