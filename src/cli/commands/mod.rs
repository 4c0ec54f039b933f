//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to
//! command-specific modules.

mod fetch;
mod import;
mod init;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Settings;

#[derive(Parser)]
#[command(name = "paperdesk")]
#[command(about = "Personal research paper aggregation and analysis assistant")]
#[command(version)]
pub struct Cli {
    /// Data directory holding the database, config, and artifacts
    /// (overrides PAPERDESK_DATA_DIR and the platform default)
    #[arg(long, short = 'd', global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Start the web server and the scheduled fetch job
    Serve {
        /// Bind address, host:port or just a port
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Run the scheduled fetch once, for every account
    Fetch,

    /// Import papers by entry id or abstract-page URL
    Import {
        /// Account the imported articles belong to
        #[arg(short, long)]
        username: String,

        /// Entry ids (e.g. 2401.00001v1) or /abs/ URLs
        #[arg(required = true)]
        entries: Vec<String>,
    },
}

/// Parse arguments and dispatch to the selected command.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.data_dir.as_deref())?;

    match cli.command {
        Commands::Init => init::cmd_init(&settings).await,
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| settings.bind.clone());
            serve::cmd_serve(&settings, &bind).await
        }
        Commands::Fetch => fetch::cmd_fetch(&settings).await,
        Commands::Import { username, entries } => {
            import::cmd_import(&settings, &username, &entries).await
        }
    }
}
