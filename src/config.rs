//! Configuration management.
//!
//! Settings come from an optional `paperdesk.toml` in the data
//! directory, with environment overrides for the data directory
//! (`PAPERDESK_DATA_DIR`) and the AI service key
//! (`PAPERDESK_LLM_API_KEY`). Nothing deployable is hard-coded: the
//! arXiv endpoint, LLM endpoint/model/key, storage root, and fetch
//! cadence all live here.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::arxiv::ArxivConfig;
use crate::llm::LlmConfig;
use crate::repository::DbContext;

/// Name of the config file inside the data directory.
const CONFIG_FILE: &str = "paperdesk.toml";

/// Fetch job settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Result cap per search.
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    /// Minutes between scheduled fetch ticks.
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,
}

fn default_max_results() -> u32 {
    5
}

fn default_interval_minutes() -> u64 {
    24 * 60
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            interval_minutes: default_interval_minutes(),
        }
    }
}

/// Application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Root for the database and config file.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Artifact storage root; defaults to `{data_dir}/papers`.
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,
    /// Server bind address for `serve`.
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub arxiv: ArxivConfig,
    #[serde(default)]
    pub llm: LlmConfig,
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("paperdesk")
}

fn default_bind() -> String {
    "127.0.0.1:5006".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            storage_dir: None,
            bind: default_bind(),
            fetch: FetchConfig::default(),
            arxiv: ArxivConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings, applying CLI and environment overrides.
    ///
    /// Priority: CLI `--data-dir` > `PAPERDESK_DATA_DIR` > config file
    /// value > platform default. The LLM key is only ever read from the
    /// environment or the config file.
    pub fn load(data_dir_override: Option<&Path>) -> anyhow::Result<Self> {
        let data_dir = data_dir_override
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("PAPERDESK_DATA_DIR").ok().map(PathBuf::from))
            .unwrap_or_else(default_data_dir);

        let config_path = data_dir.join(CONFIG_FILE);
        let mut settings = if config_path.exists() {
            let raw = std::fs::read_to_string(&config_path)?;
            toml::from_str(&raw)?
        } else {
            Settings::default()
        };
        settings.data_dir = data_dir;

        if let Ok(key) = std::env::var("PAPERDESK_LLM_API_KEY") {
            if !key.is_empty() {
                settings.llm.api_key = Some(key);
            }
        }

        Ok(settings)
    }

    /// Path of the SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("paperdesk.db")
    }

    /// Artifact storage root.
    pub fn storage_dir(&self) -> PathBuf {
        self.storage_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("papers"))
    }

    /// Create the data and storage directories if missing.
    pub fn ensure_directories(&self) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(self.storage_dir())?;
        Ok(())
    }

    /// Open a database context for this configuration.
    pub fn create_db_context(&self) -> DbContext {
        DbContext::new(&self.database_path(), &self.storage_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.fetch.max_results, 5);
        assert_eq!(settings.fetch.interval_minutes, 24 * 60);
        assert!(settings.llm.api_key.is_none());
        assert_eq!(settings.storage_dir(), settings.data_dir.join("papers"));
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let config = r#"
            bind = "0.0.0.0:8080"

            [fetch]
            max_results = 10

            [llm]
            model = "deepseek-reasoner"
        "#;
        std::fs::write(dir.path().join(CONFIG_FILE), config).unwrap();

        let settings = Settings::load(Some(dir.path())).unwrap();
        assert_eq!(settings.bind, "0.0.0.0:8080");
        assert_eq!(settings.fetch.max_results, 10);
        assert_eq!(settings.llm.model, "deepseek-reasoner");
        // Unset fields keep their defaults
        assert_eq!(settings.fetch.interval_minutes, 24 * 60);
        assert_eq!(settings.data_dir, dir.path());
    }
}
