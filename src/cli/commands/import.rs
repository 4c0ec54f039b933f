//! Batch import command.

use console::style;

use crate::arxiv::ArxivClient;
use crate::config::Settings;
use crate::ingest::IngestService;
use crate::llm::AnalysisClient;

/// Import papers by explicit entry id for one account.
pub async fn cmd_import(
    settings: &Settings,
    username: &str,
    entries: &[String],
) -> anyhow::Result<()> {
    settings.ensure_directories()?;
    let ctx = settings.create_db_context();
    ctx.init_schema().await?;

    let Some(user) = ctx.users().find_by_username(username).await? else {
        anyhow::bail!("no such user: {}", username);
    };

    let service = IngestService::new(
        ArxivClient::new(settings.arxiv.clone()),
        AnalysisClient::new(settings.llm.clone()),
        ctx,
        settings.fetch.max_results,
    );

    println!(
        "{} Importing {} entries for {}...",
        style("→").cyan(),
        entries.len(),
        username
    );
    let report = service.batch_import(&user, entries).await?;

    println!(
        "{} Done: {} imported, {} already known, {} failed",
        style("✓").green(),
        report.imported,
        report.skipped_duplicates,
        report.failed
    );

    Ok(())
}
