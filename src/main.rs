//! Paperdesk - personal research paper aggregation assistant.
//!
//! Periodically fetches papers matching per-user keywords from arXiv,
//! downloads their artifacts, requests AI analyses, and serves the
//! accumulated library through a JSON web API.

mod arxiv;
mod cli;
mod config;
mod ingest;
mod llm;
mod models;
mod repository;
mod scheduler;
mod schema;
mod server;
mod storage;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if cli::is_verbose() {
        "paperdesk=info"
    } else {
        "paperdesk=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Run CLI
    cli::run().await
}
