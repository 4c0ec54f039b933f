//! Web server command.

use std::sync::Arc;
use std::time::Duration;

use console::style;

use crate::config::Settings;
use crate::scheduler::FetchScheduler;

/// Start the web server with the recurring fetch job.
pub async fn cmd_serve(settings: &Settings, bind: &str) -> anyhow::Result<()> {
    let (host, port) = parse_bind_address(bind)?;

    settings.ensure_directories()?;
    let ctx = settings.create_db_context();
    match ctx.init_schema().await {
        Ok(()) => {
            println!("  {} Database ready", style("✓").green());
        }
        Err(e) => {
            eprintln!("  {} Schema setup failed: {}", style("✗").red(), e);
            return Err(anyhow::anyhow!("database schema setup failed: {}", e));
        }
    }

    let ingest = Arc::new(crate::ingest::IngestService::new(
        crate::arxiv::ArxivClient::new(settings.arxiv.clone()),
        crate::llm::AnalysisClient::new(settings.llm.clone()),
        ctx,
        settings.fetch.max_results,
    ));

    let scheduler = FetchScheduler::start(
        ingest.clone(),
        Duration::from_secs(settings.fetch.interval_minutes * 60),
    );

    println!(
        "{} Starting paperdesk server at http://{}:{}",
        style("→").cyan(),
        host,
        port
    );
    println!("  Press Ctrl+C to stop");

    let result = crate::server::serve(settings, ingest, &host, port).await;

    scheduler.stop().await;
    result
}

/// Parse a bind address that can be:
/// - Just a port: "5006" -> 127.0.0.1:5006
/// - Just a host: "0.0.0.0" -> 0.0.0.0:5006
/// - Host and port: "0.0.0.0:5006" -> 0.0.0.0:5006
fn parse_bind_address(bind: &str) -> anyhow::Result<(String, u16)> {
    if let Ok(port) = bind.parse::<u16>() {
        return Ok(("127.0.0.1".to_string(), port));
    }

    if let Some((host, port_str)) = bind.rsplit_once(':') {
        if let Ok(port) = port_str.parse::<u16>() {
            return Ok((host.to_string(), port));
        }
    }

    Ok((bind.to_string(), 5006))
}
