//! One-shot fetch command.

use console::style;

use crate::arxiv::ArxivClient;
use crate::config::Settings;
use crate::ingest::IngestService;
use crate::llm::AnalysisClient;

/// Run the scheduled fetch once, for every account.
pub async fn cmd_fetch(settings: &Settings) -> anyhow::Result<()> {
    settings.ensure_directories()?;
    let ctx = settings.create_db_context();
    ctx.init_schema().await?;

    let service = IngestService::new(
        ArxivClient::new(settings.arxiv.clone()),
        AnalysisClient::new(settings.llm.clone()),
        ctx,
        settings.fetch.max_results,
    );

    println!("{} Fetching new papers...", style("→").cyan());
    let report = service.run_scheduled_fetch().await?;

    println!(
        "{} Done: {} discovered, {} imported, {} already known, {} failed",
        style("✓").green(),
        report.discovered,
        report.imported,
        report.skipped_duplicates,
        report.failed
    );

    Ok(())
}
