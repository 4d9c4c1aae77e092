//! One-shot run - translates a page snapshot in place and prints the run summary
//!
//! Usage:
//!   cargo run --bin translate-once                     # Uses PAGE_SNAPSHOT (data/page.json)
//!   cargo run --bin translate-once -- path/to/page.json
//!
//! Required (from the environment or SETTINGS_FILE):
//! - DEEPL_API_KEY
//!
//! Optional:
//! - TOP_PERCENT (defaults to 20)
//! - LIKE_THRESHOLD (defaults to 1000)
//! - SOURCE_LANGUAGE (defaults to ko)
//! - TARGET_LANG (defaults to JA)

use anyhow::{Context, Result};
use comment_translator::config::Config;
use comment_translator::server::build_state;
use std::path::PathBuf;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("comment_translator=info".parse()?),
        )
        .init();

    let mut config = Config::from_env()?;
    if let Some(path) = std::env::args().nth(1) {
        config.page_snapshot = PathBuf::from(path);
    }

    let state = build_state(&config)?;
    let summary = state.pipeline.run().await;

    if !state.save_if_changed().await? {
        info!("No new annotations, {} left untouched", config.page_snapshot.display());
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&summary).context("Failed to serialize run summary")?
    );

    if let Some(error) = summary.error {
        anyhow::bail!(error);
    }
    Ok(())
}
