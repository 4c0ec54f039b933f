//! Initialize command.

use console::style;

use crate::config::Settings;

/// Initialize the data directory and database.
pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    settings.ensure_directories()?;

    let ctx = settings.create_db_context();
    ctx.init_schema().await?;

    println!(
        "{} Initialized paperdesk in {}",
        style("✓").green(),
        settings.data_dir.display()
    );
    println!("  Database: {}", settings.database_path().display());
    println!("  Artifacts: {}", settings.storage_dir().display());

    if settings.llm.api_key.is_none() {
        println!(
            "{} No LLM API key configured; analyses will be skipped",
            style("!").yellow()
        );
        println!("  Set PAPERDESK_LLM_API_KEY or add it to paperdesk.toml");
    }

    Ok(())
}
